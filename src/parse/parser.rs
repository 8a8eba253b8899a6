use std::collections::BTreeMap;

use crate::types::{split_absolute, Condition, ConditionKey, Param, Rule, RuleBuilder};

use super::error::ParseError;
use super::grammar;

/// Outcome of parsing a whole rule file: the rules that compiled, in file
/// order, plus a diagnostic for every line that did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
    rules: Vec<Rule>,
    errors: Vec<ParseError>,
}

impl ParseResult {
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Diagnostics keyed by 1-based line number.
    #[must_use]
    pub fn errors_by_line(&self) -> BTreeMap<usize, &str> {
        self.errors
            .iter()
            .map(|e| (e.line_number(), e.message()))
            .collect()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub(crate) fn parse(input: &str) -> ParseResult {
    let mut result = ParseResult::default();

    for (idx, line) in input.lines().enumerate() {
        let tokens = grammar::tokens(line);
        if tokens.is_empty() {
            continue;
        }
        let compiled = classify(&tokens).and_then(|builder| {
            builder.compile().map_err(|e| e.to_string())
        });
        match compiled {
            Ok(rule) => result.rules.push(rule),
            Err(message) => result.errors.push(ParseError::new(idx + 1, line, message)),
        }
    }

    result
}

/// Classify one line's tokens into a rule builder.
///
/// Grammar: `source [key=value ...] [destination] [status[!]] [Cond=v ...]`.
/// The destination boundary is the first token after the source that reads
/// as a path or absolute URL; `key=value` tokens before it are query-param
/// constraints, capitalized `Key=value` tokens after the status are
/// conditions.
fn classify(tokens: &[&str]) -> Result<RuleBuilder, String> {
    let mut builder = RuleBuilder::new();

    let source = tokens[0];
    if !grammar::is_path(source) {
        return Err(format!("expected a path or absolute URL, found '{source}'"));
    }
    builder.from = source.to_owned();

    let mut idx = 1;

    // Query-param constraints run until the destination token.
    while idx < tokens.len() && !grammar::is_path(tokens[idx]) {
        let token = tokens[idx];
        if grammar::parse_status(token).is_some() {
            break;
        }
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                builder.params.push(Param::new(key, value));
            }
            _ => return Err(format!("unexpected token '{token}'")),
        }
        idx += 1;
    }

    if idx < tokens.len() && grammar::is_path(tokens[idx]) {
        builder.to = tokens[idx].to_owned();
        idx += 1;
    }

    if idx < tokens.len() {
        if let Some((status, force)) = grammar::parse_status(tokens[idx]) {
            builder.status = Some(status);
            builder.force = force;
            idx += 1;
        }
    }

    if builder.to.is_empty() && builder.status.is_none() {
        return Err("missing destination".to_owned());
    }

    for token in &tokens[idx..] {
        let Some((key, value)) = token.split_once('=') else {
            return Err(format!("unexpected token '{token}'"));
        };
        let Some(key) = ConditionKey::parse(key) else {
            return Err(format!("unknown condition '{key}'"));
        };
        builder.conditions.push(Condition::new(key, value));
    }

    // Keep host/scheme off the path template; the builder re-splits, but a
    // pre-split keeps errors pointing at the path part.
    if let Some((scheme, host, path)) = split_absolute(&builder.from) {
        builder.scheme = scheme.to_owned();
        builder.host = host.to_owned();
        builder.from = path.to_owned();
    }

    Ok(builder)
}
