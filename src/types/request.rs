use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Read-only view of an incoming request, supplied by the host.
///
/// Headers use the env-style keys the host platform exposes
/// (`HTTP_X_COUNTRY`, `HTTP_X_LANGUAGE`). Query parameters are derived from
/// the query string with percent-decoding; a repeated key keeps its last
/// value.
///
/// # Example
///
/// ```
/// use reroute::Request;
///
/// let request = Request::new("/products")
///     .with_query_string("id=ipod")
///     .with_header("HTTP_X_COUNTRY", "us");
/// assert_eq!(request.query_param("id"), Some("ipod"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Request {
    path: String,
    host: String,
    scheme: String,
    query_string: String,
    query_params: HashMap<String, String>,
    cookies: HashMap<String, String>,
    env: HashMap<String, String>,
}

impl Request {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the raw query string and parse it into query parameters.
    #[must_use]
    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self.query_params = parse_query(&self.query_string);
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Set an env-style header such as `HTTP_X_COUNTRY`.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.env
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn country(&self) -> Option<&str> {
        self.header("HTTP_X_COUNTRY")
    }

    pub(crate) fn language(&self) -> Option<&str> {
        self.header("HTTP_X_LANGUAGE")
    }
}

fn parse_query(query_string: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query_string.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params.insert(decode(key), decode(value));
    }
    params
}

fn decode(component: &str) -> String {
    percent_decode_str(component)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_is_parsed() {
        let request = Request::new("/").with_query_string("page=news&id=ipod");
        assert_eq!(request.query_param("page"), Some("news"));
        assert_eq!(request.query_param("id"), Some("ipod"));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn percent_encoded_values_are_decoded() {
        let request = Request::new("/").with_query_string("_escaped_fragment_=%2Ftest");
        assert_eq!(request.query_param("_escaped_fragment_"), Some("/test"));
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let request = Request::new("/").with_query_string("t=first&t=last");
        assert_eq!(request.query_param("t"), Some("last"));
    }

    #[test]
    fn key_without_value() {
        let request = Request::new("/").with_query_string("flag");
        assert_eq!(request.query_param("flag"), Some(""));
    }

    #[test]
    fn empty_header_reads_as_absent() {
        let request = Request::new("/").with_header("HTTP_X_COUNTRY", "");
        assert_eq!(request.country(), None);
    }

    #[test]
    fn invalid_utf8_is_lossy_not_fatal() {
        let request = Request::new("/").with_query_string("url=%FF%FE");
        assert!(request.query_param("url").is_some());
    }
}
