//! Country, language, and query-param negotiation for a single rule.

use crate::types::{Condition, Param, Request};

/// Whether the request's country header is in the condition's list.
/// Country codes compare case-insensitively; a missing header never
/// satisfies the condition.
pub(crate) fn country_matches(condition: &Condition, request: &Request) -> bool {
    let Some(country) = request.country() else {
        return false;
    };
    let country = country.trim();
    condition.values().any(|c| c.eq_ignore_ascii_case(country))
}

/// Whether the request's language header matches the condition's list by
/// primary subtag: a rule value `zh` matches `zh` and any `zh-*`, while
/// `zh-tw` matches only itself.
pub(crate) fn language_matches(condition: &Condition, request: &Request) -> bool {
    let Some(language) = request.language() else {
        return false;
    };
    let language = language.trim().to_ascii_lowercase();
    condition.values().any(|value| {
        let value = value.to_ascii_lowercase();
        language == value
            || language
                .strip_prefix(&value)
                .is_some_and(|rest| rest.starts_with('-'))
    })
}

/// Check every declared query-param constraint against the request.
///
/// Returns the placeholder bindings on success. A missing key or a literal
/// mismatch rejects the whole rule; request values are compared after
/// percent-decoding.
pub(crate) fn params_match(
    params: &[Param],
    request: &Request,
) -> Option<Vec<(String, String)>> {
    let mut bindings = Vec::new();
    for param in params {
        let actual = request.query_param(&param.key)?;
        match param.placeholder() {
            Some(name) => bindings.push((name.to_owned(), actual.to_owned())),
            None => {
                if actual != param.value {
                    return None;
                }
            }
        }
    }
    Some(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConditionKey;

    fn country(list: &str) -> Condition {
        Condition::new(ConditionKey::Country, list)
    }

    fn language(list: &str) -> Condition {
        Condition::new(ConditionKey::Language, list)
    }

    #[test]
    fn country_is_case_insensitive() {
        let request = Request::new("/").with_header("HTTP_X_COUNTRY", "CN");
        assert!(country_matches(&country("cn,tw"), &request));
        assert!(!country_matches(&country("in"), &request));
    }

    #[test]
    fn country_missing_header_rejects() {
        let request = Request::new("/");
        assert!(!country_matches(&country("cn,tw"), &request));
    }

    #[test]
    fn language_primary_subtag() {
        let zh = Request::new("/").with_header("HTTP_X_LANGUAGE", "zh");
        let zh_tw = Request::new("/").with_header("HTTP_X_LANGUAGE", "zh-tw");

        assert!(language_matches(&language("zh"), &zh));
        assert!(language_matches(&language("zh"), &zh_tw));
        assert!(language_matches(&language("zh-tw"), &zh_tw));
        assert!(!language_matches(&language("zh-tw"), &zh));
        assert!(!language_matches(&language("en"), &zh));
    }

    #[test]
    fn params_bind_placeholders() {
        let request = Request::new("/products").with_query_string("id=ipod");
        let params = vec![Param::new("id", ":id")];
        assert_eq!(
            params_match(&params, &request),
            Some(vec![("id".to_owned(), "ipod".to_owned())])
        );
    }

    #[test]
    fn params_literal_compare_after_decoding() {
        let request = Request::new("/").with_query_string("_escaped_fragment_=%2Ftest");
        let params = vec![Param::new("_escaped_fragment_", "/test")];
        assert_eq!(params_match(&params, &request), Some(vec![]));

        let params = vec![Param::new("_escaped_fragment_", "/other")];
        assert_eq!(params_match(&params, &request), None);
    }

    #[test]
    fn params_missing_key_rejects() {
        let request = Request::new("/products");
        let params = vec![Param::new("id", ":id")];
        assert_eq!(params_match(&params, &request), None);
    }
}
