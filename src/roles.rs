//! Role extraction from a signed token's claims.
//!
//! The token comes from the `nf_jwt` cookie and is verified against the
//! configured secret. Every failure mode (no cookie, no secret, bad
//! signature, expired token, missing claim) degrades to an empty role set;
//! an unverifiable visitor is simply anonymous, never an error.

use std::collections::BTreeSet;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::types::{Condition, Request};

/// Default dotted claim path where authorization roles live in a token
/// payload.
pub const DEFAULT_ROLE_CLAIM: &str = "app_metadata.authorization.roles";

/// The only cookie consulted for a signed token.
pub(crate) const JWT_COOKIE: &str = "nf_jwt";

/// Verify and decode the request's token, if any.
pub(crate) fn decode_token(request: &Request, secret: &str) -> Option<Value> {
    let token = request.cookie(JWT_COOKIE).filter(|t| !t.is_empty())?;
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Value>(token, &key, &Validation::new(Algorithm::HS256))
        .ok()
        .map(|data| data.claims)
}

/// Walk a dotted claim path into the decoded payload and normalize the
/// field there into a role set. The field may be a single string or an
/// array of strings; anything else (or a missing level) is an empty set.
pub(crate) fn roles_at(claims: &Value, claim_path: &str) -> BTreeSet<String> {
    let mut node = claims;
    for segment in claim_path.split('.') {
        match node.get(segment) {
            Some(next) => node = next,
            None => return BTreeSet::new(),
        }
    }
    match node {
        Value::String(role) => BTreeSet::from([role.clone()]),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Evaluate a `Role` condition against the resolved role set. The wildcard
/// `*` accepts any authenticated role; an empty set satisfies nothing.
pub(crate) fn role_matches(condition: &Condition, roles: &BTreeSet<String>) -> bool {
    condition.values().any(|allowed| {
        if allowed == "*" {
            !roles.is_empty()
        } else {
            roles.contains(allowed)
        }
    })
}
