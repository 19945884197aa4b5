//! Common types used throughout fanout-pager
//!
//! This module contains the query/header containers that describe a request
//! and the wire envelopes shared by the decoders and the status interpreter.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

// ============================================================================
// Query Parameters
// ============================================================================

/// Ordered query-parameter multi-map.
///
/// Keys may repeat; array-valued parameters are written with the `key[]`
/// convention through [`QueryParams::add_array`]. Insertion order is kept so
/// the encoded query string is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair, keeping any existing values for the key
    pub fn add(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Append one `key[]` pair per value
    pub fn add_array<I, V>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let key = format!("{key}[]");
        for value in values {
            self.pairs.push((key.clone(), value.to_string()));
        }
        self
    }

    /// Append every pair, keeping existing values
    pub fn add_all<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (key, value) in pairs {
            self.add(key, value);
        }
        self
    }

    /// Append a pair only when the value is present
    pub fn add_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.add(key, value);
        }
        self
    }

    /// Replace every value of `key` with a single value.
    ///
    /// The new pair takes the position of the first existing occurrence, or is
    /// appended when the key is absent.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter().position(|(k, _)| *k == key) {
            Some(first) => {
                self.pairs[first].1 = value;
                let mut index = 0;
                self.pairs.retain(|(k, _)| {
                    let keep = index <= first || *k != key;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Builder-style [`QueryParams::add`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.add(key, value);
        self
    }

    /// First value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values for a key, in insertion order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove every value of a key
    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Iterate over all pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no pairs
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as an `application/x-www-form-urlencoded` query string
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.add_all(iter);
        params
    }
}

// ============================================================================
// Headers
// ============================================================================

/// Ordered header multi-map sent with every request of an endpoint.
///
/// Names compare case-insensitively and may repeat. In YAML a header is either
/// a single string or a list of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    pairs: Vec<(String, String)>,
}

impl HeaderSet {
    /// Create an empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, dropping any earlier values of the name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.remove(&name);
        self.pairs.push((name, value.into()));
        self
    }

    /// Add a value, keeping earlier values of the name
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    /// Replace every name present in `other` with its values from `other`
    pub fn merge(&mut self, other: &HeaderSet) -> &mut Self {
        for (name, _) in &other.pairs {
            self.remove(name);
        }
        self.pairs.extend(other.pairs.iter().cloned());
        self
    }

    /// First value of a header
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    /// All values of a header, in insertion order
    pub fn get_all<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> + use<'a, 'n> {
        self.pairs
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Check if a header is present
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove every value of a header
    pub fn remove(&mut self, name: &str) {
        self.pairs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Iterate over all pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no headers
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

impl Serialize for HeaderSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.pairs {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name);
            }
        }

        let mut map = serializer.serialize_map(Some(names.len()))?;
        for name in names {
            let values: Vec<&str> = self.get_all(name).collect();
            match values.as_slice() {
                [single] => map.serialize_entry(name, single)?,
                _ => map.serialize_entry(name, &values)?,
            }
        }
        map.end()
    }
}

struct HeaderSetVisitor;

impl<'de> Visitor<'de> for HeaderSetVisitor {
    type Value = HeaderSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of header names to a string or a list of strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<HeaderSet, A::Error> {
        let mut headers = HeaderSet::new();
        while let Some((name, values)) = access.next_entry::<String, HeaderValues>()? {
            match values {
                HeaderValues::One(value) => {
                    headers.append(name, value);
                }
                HeaderValues::Many(values) => {
                    for value in values {
                        headers.append(name.clone(), value);
                    }
                }
            }
        }
        Ok(headers)
    }
}

impl<'de> Deserialize<'de> for HeaderSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(HeaderSetVisitor)
    }
}

// ============================================================================
// Wire Envelopes
// ============================================================================

/// Standard success envelope: `{"success": true, "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<D> {
    /// Upstream success flag (informational)
    #[serde(default)]
    pub success: bool,
    /// Payload
    pub data: D,
}

/// Error body returned with a 400 status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub success: bool,
    pub errors: ApiErrorDetail,
}

/// Structured upstream error detail
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ApiErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code: {}, message: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_params_add_all_appends() {
        let mut params = QueryParams::new().with("address", "abc");
        params.add_all([("page", 1), ("page_size", 100)]);
        assert_eq!(params.encode(), "address=abc&page=1&page_size=100");
    }

    #[test]
    fn test_query_params_keep_repeated_keys() {
        let mut params = QueryParams::new();
        params.add("address", "abc").add_array("block_time", [10, 20]);

        assert_eq!(params.len(), 3);
        assert_eq!(
            params.get_all("block_time[]").collect::<Vec<_>>(),
            vec!["10", "20"]
        );
        assert_eq!(
            params.encode(),
            "address=abc&block_time%5B%5D=10&block_time%5B%5D=20"
        );
    }

    #[test]
    fn test_query_params_set_replaces_in_place() {
        let mut params: QueryParams =
            [("page", "1"), ("sort", "desc"), ("page", "9")].into_iter().collect();
        params.set("page", 4);

        assert_eq!(params.encode(), "page=4&sort=desc");

        params.set("page_size", 100);
        assert_eq!(params.get("page_size"), Some("100"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_query_params_add_opt_and_remove() {
        let mut params = QueryParams::new();
        params.add_opt("token", None::<&str>).add_opt("flow", Some("in"));
        assert_eq!(params.encode(), "flow=in");

        params.remove("flow");
        assert!(params.is_empty());
    }

    #[test]
    fn test_header_set_repeats_and_order() {
        let mut headers = HeaderSet::new();
        headers
            .insert("content-type", "application/json")
            .append("accept", "application/json")
            .append("Accept", "text/csv")
            .insert("Content-Type", "text/plain");

        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                ("accept", "application/json"),
                ("Accept", "text/csv"),
                ("Content-Type", "text/plain"),
            ]
        );
        assert_eq!(
            headers.get_all("ACCEPT").collect::<Vec<_>>(),
            vec!["application/json", "text/csv"]
        );
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_header_set_merge_replaces_names() {
        let mut base = HeaderSet::new();
        base.insert("content-type", "application/json").insert("token", "a");
        let mut extra = HeaderSet::new();
        extra.append("token", "b").append("token", "c");

        base.merge(&extra);
        assert_eq!(base.get("content-type"), Some("application/json"));
        assert_eq!(base.get_all("token").collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_header_set_yaml() {
        let headers: HeaderSet =
            serde_yaml::from_str("x-trace: '1'\naccept:\n  - application/json\n  - text/csv\n")
                .unwrap();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                ("x-trace", "1"),
                ("accept", "application/json"),
                ("accept", "text/csv"),
            ]
        );

        let json = serde_json::to_value(&headers).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"x-trace": "1", "accept": ["application/json", "text/csv"]})
        );
    }

    #[test]
    fn test_error_detail_display() {
        let body: ErrorEnvelope = serde_json::from_str(
            r#"{"success": false, "errors": {"code": 1100, "message": "invalid page"}}"#,
        )
        .unwrap();
        assert_eq!(body.errors.to_string(), "code: 1100, message: invalid page");
    }
}
