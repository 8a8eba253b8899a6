use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::CompileError;

/// One compiled segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// Matches itself exactly (case-sensitive).
    Literal(String),
    /// `:name`, capturing exactly one non-empty path segment.
    Placeholder(String),
    /// `*`, capturing the remainder of the path; final segment only.
    Splat,
}

/// A compiled path pattern: literal segments, `:name` placeholders, and an
/// optional trailing splat.
///
/// Patterns are path-only; absolute-URL rules keep their scheme and host on
/// the [`Rule`](super::Rule) itself. Trailing slashes are normalized away on
/// both the pattern and the matched path, except for the root path `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    has_splat: bool,
}

/// Values captured while matching a [`PathTemplate`] and evaluating query
/// params, keyed by placeholder name. The splat remainder is addressed as
/// `splat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    named: Vec<(String, String)>,
    splat: Option<String>,
}

impl Captures {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        if name == "splat" {
            return self.splat.as_deref();
        }
        self.named
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn splat(&self) -> Option<&str> {
        self.splat.as_deref()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.named.push((name.into(), value.into()));
    }

    pub(crate) fn set_splat(&mut self, value: impl Into<String>) {
        self.splat = Some(value.into());
    }
}

/// Trim trailing slashes, treating `/foo/` and `/foo` as the same path.
/// The root path is left alone.
pub(crate) fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Split `scheme://host/path` into its parts. Returns `None` for anything
/// that is not an absolute URL. A URL without a path gets `/`.
pub(crate) fn split_absolute(url: &str) -> Option<(&str, &str, &str)> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let (host, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    if host.is_empty() {
        return None;
    }
    Some((scheme, host, path))
}

impl PathTemplate {
    /// Compile a pattern string. A final `:splat` segment is equivalent to
    /// `*`, so destination patterns like `/admin/:splat` can be matched
    /// against as well.
    pub fn compile(pattern: &str) -> Result<Self, CompileError> {
        if !pattern.starts_with('/') {
            return Err(CompileError::InvalidPattern {
                pattern: pattern.to_owned(),
            });
        }

        let normalized = normalize(pattern);
        let mut segments = Vec::new();
        let mut has_splat = false;

        if normalized != "/" {
            let parts: Vec<&str> = normalized[1..].split('/').collect();
            let last = parts.len() - 1;
            for (idx, part) in parts.iter().enumerate() {
                if *part == "*" || (*part == ":splat" && idx == last) {
                    if idx != last {
                        return Err(CompileError::SplatNotFinal {
                            pattern: pattern.to_owned(),
                        });
                    }
                    has_splat = true;
                    segments.push(Segment::Splat);
                } else if let Some(name) = part.strip_prefix(':') {
                    if name.is_empty() {
                        segments.push(Segment::Literal((*part).to_owned()));
                    } else {
                        segments.push(Segment::Placeholder(name.to_owned()));
                    }
                } else {
                    segments.push(Segment::Literal((*part).to_owned()));
                }
            }
        }

        Ok(Self {
            raw: pattern.to_owned(),
            segments,
            has_splat,
        })
    }

    /// The pattern string this template was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn has_splat(&self) -> bool {
        self.has_splat
    }

    /// Number of capturing segments (placeholders plus splat). A template
    /// with no captures matches exactly one concrete path.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| !matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Names a destination rendered from this template can reference.
    pub(crate) fn capture_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Splat => Some("splat"),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Match a concrete request path, returning the captured values.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Captures> {
        if !path.starts_with('/') {
            return None;
        }
        let normalized = normalize(path);
        let parts: Vec<&str> = if normalized == "/" {
            Vec::new()
        } else {
            normalized[1..].split('/').collect()
        };

        let fixed = if self.has_splat {
            self.segments.len() - 1
        } else {
            self.segments.len()
        };

        if self.has_splat {
            if parts.len() < fixed {
                return None;
            }
        } else if parts.len() != fixed {
            return None;
        }

        let mut captures = Captures::default();
        for (segment, part) in self.segments.iter().zip(parts.iter()) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Placeholder(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    captures.insert(name.clone(), *part);
                }
                Segment::Splat => break,
            }
        }

        if self.has_splat {
            captures.set_splat(parts[fixed..].join("/"));
        }

        Some(captures)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

// Templates serialize as their pattern string and recompile on the way back
// in, so persisted rule tables stay readable.
impl Serialize for PathTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PathTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::compile(&raw).map_err(serde::de::Error::custom)
    }
}

/// Substitute `:name` tokens in a destination string from the captured
/// values. Literal text passes through unchanged; a `:` not followed by an
/// identifier (as in `https://`) is left alone. Unresolved names are kept
/// literally; rule compilation guarantees they are bound.
pub(crate) fn render(template: &str, captures: &Captures) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(idx) = rest.find(':') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        let end = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..end];
        let is_token = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if is_token {
            if let Some(value) = captures.get(name) {
                out.push_str(value);
            } else {
                debug_assert!(false, "unbound destination placeholder :{name}");
                out.push(':');
                out.push_str(name);
            }
        } else {
            out.push(':');
            out.push_str(name);
        }
        rest = &after[end..];
    }
    out.push_str(rest);
    out
}

/// Collect every `:name` token referenced by a destination string.
pub(crate) fn placeholder_names(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(idx) = rest.find(':') {
        let after = &rest[idx + 1..];
        let end = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..end];
        if name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            names.push(name);
        }
        rest = &after[end..];
    }
    names
}
