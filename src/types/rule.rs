use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::CompileError;
use super::request::Request;
use super::template::{self, PathTemplate};

/// A query-parameter constraint: the request must carry `key` with a value
/// that equals `value` literally, or binds it when `value` is a `:name`
/// placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl Param {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The placeholder name when the expected value is a `:name` binding.
    pub(crate) fn placeholder(&self) -> Option<&str> {
        self.value
            .strip_prefix(':')
            .filter(|name| !name.is_empty())
    }
}

/// Recognized condition kinds on a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionKey {
    Country,
    Language,
    Role,
}

impl ConditionKey {
    pub(crate) fn parse(key: &str) -> Option<Self> {
        match key {
            "Country" => Some(Self::Country),
            "Language" => Some(Self::Language),
            "Role" => Some(Self::Role),
            _ => None,
        }
    }

    /// Key under which this condition is reported in match results.
    /// Role conditions surface as `JWT` so hosts can build an
    /// authorization prompt from the claim-path description.
    pub(crate) fn result_key(self) -> &'static str {
        match self {
            Self::Country => "Country",
            Self::Language => "Language",
            Self::Role => "JWT",
        }
    }
}

impl fmt::Display for ConditionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Country => write!(f, "Country"),
            Self::Language => write!(f, "Language"),
            Self::Role => write!(f, "Role"),
        }
    }
}

/// One condition on a rule: a kind plus its raw comma-separated value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub key: ConditionKey,
    pub value: String,
}

impl Condition {
    pub fn new(key: ConditionKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// The individual acceptable values, trimmed, empty entries dropped.
    pub(crate) fn values(&self) -> impl Iterator<Item = &str> {
        self.value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// The destination of a redirect rule, compiled as a pattern so the matcher
/// can detect a request that already sits at the rule's target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DestinationPattern {
    scheme: Option<String>,
    host: Option<String>,
    template: PathTemplate,
}

/// Mutable staging area for a [`Rule`]. The parser fills one per line;
/// hosts holding rules in a database construct them here directly.
/// [`compile()`](RuleBuilder::compile) validates and freezes the rule.
///
/// Builders serialize cleanly, so hosts that keep rules in a database can
/// persist them as JSON and [`compile()`](RuleBuilder::compile) on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleBuilder {
    pub from: String,
    /// Destination path or absolute URL. Empty means a forward rule.
    pub to: String,
    pub host: String,
    pub scheme: String,
    pub status: Option<u16>,
    pub force: bool,
    pub params: Vec<Param>,
    pub conditions: Vec<Condition>,
}

impl RuleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and compile into an immutable [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when the source pattern is malformed, a
    /// forward rule carries a non-200 status, or the destination references
    /// a placeholder nothing captures.
    pub fn compile(self) -> Result<Rule, CompileError> {
        if self.from.is_empty() {
            return Err(CompileError::MissingSource);
        }

        let mut scheme = none_if_empty(self.scheme);
        let mut host = none_if_empty(self.host);
        let mut from = self.from;
        if let Some((s, h, path)) = template::split_absolute(&from) {
            scheme = Some(s.to_owned());
            host = Some(h.to_owned());
            from = path.to_owned();
        }

        let path = PathTemplate::compile(&from)?;

        let (to, status) = if self.to.is_empty() {
            let status = self.status.unwrap_or(200);
            if status != 200 {
                return Err(CompileError::ForwardStatus { status });
            }
            (forward_destination(&from), status)
        } else {
            let status = self
                .status
                .unwrap_or(if self.to == from { 200 } else { 301 });
            (self.to, status)
        };

        let proxy = template::split_absolute(&to).is_some() && status == 200;

        let mut bindable: Vec<&str> = path.capture_names();
        for param in &self.params {
            if let Some(name) = param.placeholder() {
                bindable.push(name);
            }
        }
        for name in template::placeholder_names(&to) {
            if !bindable.contains(&name) {
                return Err(CompileError::UnboundPlaceholder {
                    name: name.to_owned(),
                });
            }
        }

        let to_pattern = destination_pattern(&to);

        Ok(Rule {
            path,
            to,
            host,
            scheme,
            status,
            force: self.force,
            proxy,
            params: self.params,
            conditions: self.conditions,
            to_pattern,
        })
    }
}

/// One routing directive: source pattern, destination, status, and the
/// conditions gating it. Immutable once compiled; a rule table's order is
/// the rule file's order and is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub path: PathTemplate,
    pub to: String,
    pub host: Option<String>,
    pub scheme: Option<String>,
    pub status: u16,
    pub force: bool,
    pub proxy: bool,
    pub params: Vec<Param>,
    pub conditions: Vec<Condition>,
    #[serde(skip)]
    pub(crate) to_pattern: Option<DestinationPattern>,
}

impl Rule {
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::new()
    }

    #[must_use]
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    #[must_use]
    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// A matched rule shadows any file at the source path when it is
    /// forced, condition- or param-gated, or matches exactly one path.
    pub(crate) fn force_match(&self) -> bool {
        self.force
            || self.has_conditions()
            || self.has_params()
            || self.path.capture_count() == 0
    }

    /// Whether the request already sits at this rule's destination
    /// (redirect-loop guard).
    pub(crate) fn shadows(&self, request: &Request) -> bool {
        let Some(dest) = &self.to_pattern else {
            return false;
        };
        if let Some(host) = &dest.host {
            if host != request.host() {
                return false;
            }
        }
        if let Some(scheme) = &dest.scheme {
            if scheme != request.scheme() {
                return false;
            }
        }
        dest.template.matches(request.path()).is_some()
    }
}

fn none_if_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// A forward rule serves the source path itself: the implicit destination is
/// the source with a splat materialized as `:splat`.
fn forward_destination(from: &str) -> String {
    match from.strip_suffix('*') {
        Some(prefix) => format!("{prefix}:splat"),
        None => from.to_owned(),
    }
}

fn destination_pattern(to: &str) -> Option<DestinationPattern> {
    let (scheme, host, path) = match template::split_absolute(to) {
        Some((s, h, p)) => (Some(s.to_owned()), Some(h.to_owned()), p),
        None => (None, None, to),
    };
    // Query strings and anchors are not part of the shadow check.
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.is_empty() {
        return None;
    }
    PathTemplate::compile(path).ok().map(|template| {
        DestinationPattern {
            scheme,
            host,
            template,
        }
    })
}
