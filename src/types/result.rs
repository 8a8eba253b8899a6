use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Ordered condition-name to acceptable-value-set maps accumulated during a
/// match. Sets render as sorted comma-joined strings.
pub(crate) type ConditionSets = BTreeMap<String, BTreeSet<String>>;

/// Condition key used for query-parameter constraints in match results.
pub(crate) const QUERY_KEY: &str = "Query";

/// Condition key used for role constraints in match results.
pub(crate) const JWT_KEY: &str = "JWT";

/// A resolved rule: destination rendered, status and flags attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    /// Destination with placeholders and splat substituted.
    pub to: String,
    pub status: u16,
    /// The rule's own `!` force flag.
    pub force: bool,
    /// Whether this match shadows an existing file at the request path:
    /// forced, condition- or param-gated, or an exact-path rule.
    pub force_match: bool,
    pub proxy: bool,
}

/// Outcome of matching one request against a rule table.
///
/// Either a [`RuleMatch`] or nothing; in both cases the satisfied condition
/// of the winning rule (under `conditions`) and the union of acceptable
/// values from rejected path-matching candidates (under `exceptions`) are
/// exposed for cache variation and authorization prompts. `Role` entries
/// surface under the `JWT` key as `<claim path>:<roles>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    matched: Option<RuleMatch>,
    conditions: ConditionSets,
    exceptions: ConditionSets,
    force_404: bool,
    role_claim: String,
}

impl MatchResult {
    pub(crate) fn new(
        matched: Option<RuleMatch>,
        conditions: ConditionSets,
        exceptions: ConditionSets,
        force_404: bool,
        role_claim: String,
    ) -> Self {
        Self {
            matched,
            conditions,
            exceptions,
            force_404,
            role_claim,
        }
    }

    #[must_use]
    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }

    #[must_use]
    pub fn rule(&self) -> Option<&RuleMatch> {
        self.matched.as_ref()
    }

    #[must_use]
    pub fn into_rule(self) -> Option<RuleMatch> {
        self.matched
    }

    /// `true` when the only path-matching candidates were role-gated and
    /// none had a fallback: nothing will ever unconditionally serve this
    /// path, so the host should deny outright.
    #[must_use]
    pub fn force_404(&self) -> bool {
        self.force_404
    }

    /// The satisfied condition(s) of the winning rule, rendered.
    #[must_use]
    pub fn conditions(&self) -> BTreeMap<String, String> {
        self.render_all(&self.conditions)
    }

    /// What would have allowed a match, rendered: the union of acceptable
    /// values across every path-matching rule whose condition failed.
    #[must_use]
    pub fn exceptions(&self) -> BTreeMap<String, String> {
        self.render_all(&self.exceptions)
    }

    #[must_use]
    pub fn condition(&self, key: &str) -> Option<String> {
        self.conditions
            .get(key)
            .map(|values| self.render(key, values))
    }

    #[must_use]
    pub fn exception(&self, key: &str) -> Option<String> {
        self.exceptions
            .get(key)
            .map(|values| self.render(key, values))
    }

    fn render_all(&self, sets: &ConditionSets) -> BTreeMap<String, String> {
        sets.iter()
            .map(|(key, values)| (key.clone(), self.render(key, values)))
            .collect()
    }

    fn render(&self, key: &str, values: &BTreeSet<String>) -> String {
        let joined = values.iter().cloned().collect::<Vec<_>>().join(",");
        if key == JWT_KEY {
            format!("{}:{}", self.role_claim, joined)
        } else {
            joined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(entries: &[(&str, &[&str])]) -> ConditionSets {
        entries
            .iter()
            .map(|(key, values)| {
                (
                    (*key).to_owned(),
                    values.iter().map(|v| (*v).to_owned()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn values_render_sorted_and_joined() {
        let result = MatchResult::new(
            None,
            ConditionSets::new(),
            sets(&[("Country", &["tw", "cn"])]),
            false,
            "app_metadata.authorization.roles".into(),
        );
        assert_eq!(result.exception("Country").as_deref(), Some("cn,tw"));
        assert!(result.condition("Country").is_none());
    }

    #[test]
    fn jwt_values_carry_the_claim_path() {
        let result = MatchResult::new(
            None,
            ConditionSets::new(),
            sets(&[("JWT", &["admin", "editor"])]),
            false,
            "app_metadata.authorization.roles".into(),
        );
        assert_eq!(
            result.exception("JWT").as_deref(),
            Some("app_metadata.authorization.roles:admin,editor")
        );
    }

    #[test]
    fn no_match_result() {
        let result = MatchResult::new(
            None,
            ConditionSets::new(),
            ConditionSets::new(),
            true,
            "roles".into(),
        );
        assert!(!result.is_match());
        assert!(result.force_404());
        assert!(result.exceptions().is_empty());
    }
}
