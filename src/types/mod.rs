mod error;
mod request;
mod result;
mod rule;
mod template;

pub use error::CompileError;
pub use request::Request;
pub use result::{MatchResult, RuleMatch};
pub use rule::{Condition, ConditionKey, Param, Rule, RuleBuilder};
pub use template::{Captures, PathTemplate};

pub(crate) use result::{ConditionSets, QUERY_KEY};
pub(crate) use template::{render, split_absolute};
