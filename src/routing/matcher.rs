//! Prefix pattern matching.
//!
//! # Responsibilities
//! - Compile a prefix pattern (`data/:clientId`, `server/:id/*`) into segments
//! - Test a concrete path against the compiled segments
//! - Extract named and positional captures in pattern order
//!
//! # Design Decisions
//! - Segment walk, no regex
//! - A single trailing slash is ignored on both the pattern and the path
//! - Literal segments are case-sensitive
//! - `*` captures only as the final segment; elsewhere it is literal text
//! - Matching runs on the raw path; captured values are percent-decoded
//! - Compilation never fails, so any registration string is a valid prefix

use std::borrow::Cow;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Positional key under which the trailing wildcard capture is stored.
pub const WILDCARD_KEY: &str = "0";

/// Ordered parameter captures produced by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a capture. A repeated name keeps its first position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((name, value)),
        }
    }

    /// Compact JSON object, as reported in the `params` response header.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
impl Params {
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled prefix pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatcher {
    pattern: String,
    segments: Vec<Segment>,
}

impl PrefixMatcher {
    /// Compile a registration string into a matcher.
    pub fn compile(pattern: &str) -> Self {
        let parts = split_segments(pattern);
        let last = parts.len().saturating_sub(1);

        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| match *part {
                "*" if i == last => Segment::Wildcard,
                part => match part.strip_prefix(':') {
                    Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                    _ => Segment::Literal(part.to_string()),
                },
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// The raw registration string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[cfg(test)]
    pub(crate) fn is_match(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Match `path`, returning the captures on success.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let parts = split_segments(path);
        let mut params = Params::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => {
                    let rest = parts.get(i..).filter(|rest| !rest.is_empty())?;
                    params.insert(WILDCARD_KEY, decode_capture(&rest.join("/")));
                    return Some(params);
                }
                Segment::Param(name) => {
                    let value = parts.get(i).filter(|value| !value.is_empty())?;
                    params.insert(name.as_str(), decode_capture(value));
                }
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

/// Percent-decode a captured value. Sequences that decode to invalid UTF-8 stay raw.
fn decode_capture(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

fn split_segments(s: &str) -> Vec<&str> {
    let trimmed = s.strip_suffix('/').unwrap_or(s);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_param() {
        let matcher = PrefixMatcher::compile("data/:clientId");

        let params = matcher.captures("data/testclient").unwrap();
        assert_eq!(params.get("clientId"), Some("testclient"));
        assert_eq!(params.len(), 1);

        assert!(!matcher.is_match("data"));
        assert!(!matcher.is_match("data/a/b"));
        assert!(!matcher.is_match("other/testclient"));
    }

    #[test]
    fn test_params_keep_pattern_order() {
        let matcher = PrefixMatcher::compile("client/:from/:to");
        let params = matcher.captures("client/c1/c2").unwrap();

        let expected: Params = [("from", "c1"), ("to", "c2")].into_iter().collect();
        assert_eq!(params, expected);
        assert_eq!(params.to_json(), r#"{"from":"c1","to":"c2"}"#);
    }

    #[test]
    fn test_trailing_wildcard() {
        let matcher = PrefixMatcher::compile("data/*");

        let params = matcher.captures("data/variable/path/1").unwrap();
        assert_eq!(params.get(WILDCARD_KEY), Some("variable/path/1"));

        let params = matcher.captures("data/r").unwrap();
        assert_eq!(params.get("0"), Some("r"));

        // Needs at least one segment after the literal part
        assert!(!matcher.is_match("data"));
        assert!(!matcher.is_match("data/"));
    }

    #[test]
    fn test_param_then_wildcard() {
        let matcher = PrefixMatcher::compile("server/:clientId/*");
        let params = matcher.captures("server/client1/new/joined").unwrap();

        assert_eq!(params.get("clientId"), Some("client1"));
        assert_eq!(params.get("0"), Some("new/joined"));
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        let matcher = PrefixMatcher::compile("Data/:id");
        assert!(matcher.is_match("Data/1"));
        assert!(!matcher.is_match("data/1"));
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let matcher = PrefixMatcher::compile("data/:id/");
        assert!(matcher.is_match("data/x"));
        assert!(matcher.is_match("data/x/"));

        let matcher = PrefixMatcher::compile("data/:id");
        assert!(matcher.is_match("data/x/"));
    }

    #[test]
    fn test_empty_pattern_matches_only_empty_path() {
        let matcher = PrefixMatcher::compile("");
        assert!(matcher.is_match(""));
        assert!(matcher.is_match("/"));
        assert!(!matcher.is_match("data"));
        assert!(matcher.captures("").unwrap().is_empty());
    }

    #[test]
    fn test_inner_star_is_literal() {
        let matcher = PrefixMatcher::compile("a/*/b");
        assert!(matcher.is_match("a/*/b"));
        assert!(!matcher.is_match("a/x/b"));
    }

    #[test]
    fn test_bare_colon_is_literal() {
        let matcher = PrefixMatcher::compile("a/:");
        assert!(matcher.is_match("a/:"));
        assert!(!matcher.is_match("a/x"));
    }

    #[test]
    fn test_empty_segment_does_not_bind_param() {
        let matcher = PrefixMatcher::compile("data/:id/tail");
        assert!(!matcher.is_match("data//tail"));
    }

    #[test]
    fn test_captures_are_percent_decoded() {
        let matcher = PrefixMatcher::compile("data/:id");
        let params = matcher.captures("data/a%20b").unwrap();
        assert_eq!(params.get("id"), Some("a b"));
        assert_eq!(params.to_json(), r#"{"id":"a b"}"#);

        // An encoded slash stays inside one segment, then decodes.
        let matcher = PrefixMatcher::compile("data/*");
        let params = matcher.captures("data/p%2Fq/r%C3%A9").unwrap();
        assert_eq!(params.get(WILDCARD_KEY), Some("p/q/ré"));

        // Literals are compared raw.
        assert!(!PrefixMatcher::compile("a b/:id").is_match("a%20b/1"));
    }

    #[test]
    fn test_undecodable_capture_stays_raw() {
        let matcher = PrefixMatcher::compile("data/:id");
        let params = matcher.captures("data/%FF").unwrap();
        assert_eq!(params.get("id"), Some("%FF"));
    }
}
