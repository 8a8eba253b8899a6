//! A declarative redirect/rewrite rule engine for static hosting.
//!
//! [`parse()`] turns line-oriented rule text into an ordered table of
//! [`Rule`]s plus per-line diagnostics; [`Matcher`] resolves a [`Request`]
//! against that table, honoring country, language, query, and role
//! conditions. The engine performs no I/O: rule text and request come in,
//! a [`MatchResult`] comes out.

mod conditions;
mod matcher;
mod parse;
mod roles;
mod types;

pub use matcher::Matcher;
pub use parse::{parse, ParseError, ParseResult};
pub use roles::DEFAULT_ROLE_CLAIM;
pub use types::{
    Captures, CompileError, Condition, ConditionKey, MatchResult, Param, PathTemplate, Request,
    Rule, RuleBuilder, RuleMatch,
};
