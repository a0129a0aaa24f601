//! Key paths and the comma-separated prefix syntax.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One element of a key path.
///
/// Variant order is the store's key order: every string sorts before every
/// integer, strings compare bytewise and integers numerically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    Str(String),
    Int(i64),
}

impl KeySegment {
    /// Coerce a raw segment: an integer only when the text is exactly the
    /// canonical decimal form of that integer.
    pub fn coerce(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => KeySegment::Int(n),
            _ => KeySegment::Str(raw.to_string()),
        }
    }
}

impl From<&str> for KeySegment {
    fn from(s: &str) -> Self {
        KeySegment::Str(s.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(s: String) -> Self {
        KeySegment::Str(s)
    }
}

impl From<i64> for KeySegment {
    fn from(n: i64) -> Self {
        KeySegment::Int(n)
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Str(s) => write!(f, "{:?}", s),
            KeySegment::Int(n) => write!(f, "{}", n),
        }
    }
}

/// An ordered key path, used both as a query prefix and as an entry's key.
///
/// Ordering is lexicographic over segments, so a proper prefix sorts before
/// every path that extends it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath(Vec<KeySegment>);

impl KeyPath {
    pub fn new(segments: Vec<KeySegment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `prefix` is a (not necessarily proper) prefix of this path.
    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn push(&mut self, segment: impl Into<KeySegment>) {
        self.0.push(segment.into());
    }

    /// The path as a JSON array of strings and numbers.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|segment| match segment {
                    KeySegment::Str(s) => Value::String(s.clone()),
                    KeySegment::Int(n) => Value::from(*n),
                })
                .collect(),
        )
    }
}

impl From<Vec<KeySegment>> for KeyPath {
    fn from(segments: Vec<KeySegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", segment)?;
        }
        write!(f, "]")
    }
}

/// Parse a comma-separated prefix into a key path.
///
/// Segments are coerced independently (see [`KeySegment::coerce`]). Empty
/// segments are kept as empty-string keys.
pub fn parse_prefix(prefix: &str) -> KeyPath {
    KeyPath(prefix.split(',').map(KeySegment::coerce).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> KeySegment {
        KeySegment::from(v)
    }

    fn i(v: i64) -> KeySegment {
        KeySegment::from(v)
    }

    #[test]
    fn test_parse_mixed_prefix() {
        assert_eq!(parse_prefix("12,a,03"), KeyPath::new(vec![i(12), s("a"), s("03")]));
    }

    #[test]
    fn test_parse_single_string() {
        assert_eq!(parse_prefix("logs"), KeyPath::new(vec![s("logs")]));
    }

    #[test]
    fn test_parse_negative_integer() {
        assert_eq!(parse_prefix("-7"), KeyPath::new(vec![i(-7)]));
    }

    #[test]
    fn test_non_canonical_numbers_stay_strings() {
        let path = parse_prefix("1.5,+5,-0,1e3, 4,0x10");
        assert_eq!(
            path,
            KeyPath::new(vec![s("1.5"), s("+5"), s("-0"), s("1e3"), s(" 4"), s("0x10")])
        );
    }

    #[test]
    fn test_zero_is_integer() {
        assert_eq!(parse_prefix("0"), KeyPath::new(vec![i(0)]));
    }

    #[test]
    fn test_out_of_range_integer_stays_string() {
        let path = parse_prefix("99999999999999999999");
        assert_eq!(path, KeyPath::new(vec![s("99999999999999999999")]));
    }

    #[test]
    fn test_empty_segments_are_kept() {
        assert_eq!(parse_prefix("a,,b"), KeyPath::new(vec![s("a"), s(""), s("b")]));
        assert_eq!(parse_prefix(""), KeyPath::new(vec![s("")]));
        assert_eq!(parse_prefix("a,"), KeyPath::new(vec![s("a"), s("")]));
    }

    #[test]
    fn test_strings_sort_before_integers() {
        assert!(s("zzz") < i(-1_000));
        assert!(i(2) < i(10));
        assert!(s("10") < s("2"));
    }

    #[test]
    fn test_prefix_sorts_before_extension() {
        let parent = KeyPath::new(vec![s("logs")]);
        let child = KeyPath::new(vec![s("logs"), s("")]);
        assert!(parent < child);
        assert!(child.starts_with(&parent));
        assert!(!parent.starts_with(&child));
    }

    #[test]
    fn test_display_and_json() {
        let path = KeyPath::new(vec![s("logs"), i(3)]);
        assert_eq!(path.to_string(), r#"["logs",3]"#);
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["logs",3]"#);
    }
}
