//! Single-pass resolution of a request against an ordered rule table.

use std::collections::BTreeSet;

use crate::conditions;
use crate::roles;
use crate::types::{
    render, Condition, ConditionKey, ConditionSets, MatchResult, Request, Rule, RuleMatch,
    QUERY_KEY,
};

/// Resolves requests against an immutable rule table.
///
/// Stateless per call: a `Matcher` borrows the table and can be shared
/// freely across threads. The first rule whose path and conditions are all
/// satisfied wins over the whole table; rejected candidates contribute
/// their acceptable values to the result's exceptions instead.
///
/// # Example
///
/// ```
/// use reroute::{parse, Matcher, Request};
///
/// let rules = parse("/news/*  /blog/:splat").into_rules();
/// let result = Matcher::new(&rules).resolve(&Request::new("/news/article"));
/// assert_eq!(result.rule().unwrap().to, "/blog/article");
/// ```
#[derive(Debug)]
pub struct Matcher<'r> {
    rules: &'r [Rule],
    secret: Option<String>,
    role_claim: String,
}

impl<'r> Matcher<'r> {
    #[must_use]
    pub fn new(rules: &'r [Rule]) -> Self {
        Self {
            rules,
            secret: None,
            role_claim: roles::DEFAULT_ROLE_CLAIM.to_owned(),
        }
    }

    /// Secret used to verify the `nf_jwt` token cookie. Without one, every
    /// request is anonymous.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Override the dotted claim path roles are read from.
    #[must_use]
    pub fn with_role_claim(mut self, claim_path: impl Into<String>) -> Self {
        self.role_claim = claim_path.into();
        self
    }

    /// Resolve a request to the first fully-satisfied rule, or to the
    /// accumulated exceptions describing what would have matched.
    #[must_use]
    pub fn resolve(&self, request: &Request) -> MatchResult {
        let mut conditions = ConditionSets::new();
        let mut exceptions = ConditionSets::new();
        // Decoded lazily, once, on the first Role condition encountered.
        let mut roles: Option<BTreeSet<String>> = None;
        let mut rejected = 0usize;
        let mut role_rejected = 0usize;

        for rule in self.rules {
            if let Some(host) = &rule.host {
                if host != request.host() {
                    continue;
                }
            }
            if let Some(scheme) = &rule.scheme {
                if scheme != request.scheme() {
                    continue;
                }
            }
            let Some(mut captures) = rule.path.matches(request.path()) else {
                continue;
            };

            if rule.has_params() {
                conditions
                    .entry(QUERY_KEY.to_owned())
                    .or_default()
                    .insert(request.query_string().to_owned());
                match conditions::params_match(&rule.params, request) {
                    Some(bindings) => {
                        for (name, value) in bindings {
                            captures.insert(name, value);
                        }
                    }
                    None => {
                        rejected += 1;
                        continue;
                    }
                }
            }

            let mut satisfied = true;
            for condition in &rule.conditions {
                let ok = match condition.key {
                    ConditionKey::Country => conditions::country_matches(condition, request),
                    ConditionKey::Language => conditions::language_matches(condition, request),
                    ConditionKey::Role => {
                        let resolved = roles
                            .get_or_insert_with(|| self.resolve_roles(request));
                        roles::role_matches(condition, resolved)
                    }
                };
                if !ok {
                    record(&mut exceptions, condition);
                    rejected += 1;
                    if condition.key == ConditionKey::Role {
                        role_rejected += 1;
                    }
                    satisfied = false;
                    break;
                }
            }
            if !satisfied {
                continue;
            }

            for condition in &rule.conditions {
                record(&mut conditions, condition);
            }
            for key in conditions.keys() {
                exceptions.remove(key);
            }

            // Redirect-loop guard: a request already sitting at a redirect
            // rule's destination is served as-is, and the scan stops so a
            // broader rule cannot bounce it back.
            if rule.is_redirect() && rule.shadows(request) {
                return MatchResult::new(
                    None,
                    conditions,
                    exceptions,
                    false,
                    self.role_claim.clone(),
                );
            }

            let matched = RuleMatch {
                to: render(&rule.to, &captures),
                status: rule.status,
                force: rule.force,
                force_match: rule.force_match(),
                proxy: rule.proxy,
            };
            return MatchResult::new(
                Some(matched),
                conditions,
                exceptions,
                false,
                self.role_claim.clone(),
            );
        }

        let force_404 = rejected > 0 && role_rejected == rejected;
        MatchResult::new(None, conditions, exceptions, force_404, self.role_claim.clone())
    }

    fn resolve_roles(&self, request: &Request) -> BTreeSet<String> {
        let Some(secret) = &self.secret else {
            return BTreeSet::new();
        };
        roles::decode_token(request, secret)
            .map(|claims| roles::roles_at(&claims, &self.role_claim))
            .unwrap_or_default()
    }
}

fn record(sets: &mut ConditionSets, condition: &Condition) {
    let entry = sets
        .entry(condition.key.result_key().to_owned())
        .or_default();
    for value in condition.values() {
        entry.insert(value.to_owned());
    }
}
