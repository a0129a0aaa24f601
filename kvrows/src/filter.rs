//! Field projection: keep or drop named fields of a flat record.

use std::collections::BTreeSet;

use crate::schema::FlatRecord;
use crate::{Error, Result};

/// Which fields of a record to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterSpec {
    /// Show every field.
    #[default]
    All,
    /// Show only these fields.
    Include(BTreeSet<String>),
    /// Show every field except these.
    Exclude(BTreeSet<String>),
}

impl FilterSpec {
    /// Build a filter from the comma-separated `--include` / `--exclude`
    /// values. An absent or empty value counts as not given; giving both is
    /// a usage conflict.
    pub fn from_flags(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        let include = include.filter(|s| !s.is_empty());
        let exclude = exclude.filter(|s| !s.is_empty());

        match (include, exclude) {
            (Some(_), Some(_)) => Err(Error::UsageConflict),
            (Some(names), None) => Ok(FilterSpec::Include(split_names(names))),
            (None, Some(names)) => Ok(FilterSpec::Exclude(split_names(names))),
            (None, None) => Ok(FilterSpec::All),
        }
    }

    /// Whether a field with this name survives the filter.
    pub fn keeps(&self, name: &str) -> bool {
        match self {
            FilterSpec::All => true,
            FilterSpec::Include(names) => names.contains(name),
            FilterSpec::Exclude(names) => !names.contains(name),
        }
    }

    /// Apply the filter, preserving field order.
    pub fn project(&self, mut record: FlatRecord) -> FlatRecord {
        if *self != FilterSpec::All {
            record.retain(|name| self.keeps(name));
        }
        record
    }
}

fn split_names(list: &str) -> BTreeSet<String> {
    list.split(',').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> FlatRecord {
        match value {
            Value::Object(map) => FlatRecord::from(map),
            other => panic!("expected object, got {}", other),
        }
    }

    fn names(record: &FlatRecord) -> Vec<&str> {
        record.names().collect()
    }

    fn sample() -> FlatRecord {
        record(json!({"key": [1], "ts": 5, "url": "/", "ua": "curl", "status": 200}))
    }

    #[test]
    fn test_no_flags_is_all() {
        assert_eq!(FilterSpec::from_flags(None, None).unwrap(), FilterSpec::All);
        assert_eq!(FilterSpec::from_flags(Some(""), Some("")).unwrap(), FilterSpec::All);
    }

    #[test]
    fn test_both_flags_conflict() {
        let err = FilterSpec::from_flags(Some("ts"), Some("url")).unwrap_err();
        assert!(matches!(err, Error::UsageConflict));
        assert_eq!(err.to_string(), "exclude and include options are exclusive.");
    }

    #[test]
    fn test_empty_flag_does_not_conflict() {
        let spec = FilterSpec::from_flags(Some("ts"), Some("")).unwrap();
        assert!(matches!(spec, FilterSpec::Include(_)));
    }

    #[test]
    fn test_all_passes_through() {
        assert_eq!(FilterSpec::All.project(sample()), sample());
    }

    #[test]
    fn test_include_keeps_listed_fields_in_record_order() {
        let spec = FilterSpec::from_flags(Some("url,ts"), None).unwrap();
        let out = spec.project(sample());
        assert_eq!(names(&out), vec!["ts", "url"]);
        assert_eq!(out.get("ts"), Some(&json!(5)));
    }

    #[test]
    fn test_include_ignores_unknown_names() {
        let spec = FilterSpec::from_flags(Some("ts,nope"), None).unwrap();
        assert_eq!(names(&spec.project(sample())), vec!["ts"]);

        let spec = FilterSpec::from_flags(Some("nope"), None).unwrap();
        assert!(spec.project(sample()).is_empty());
    }

    #[test]
    fn test_exclude_drops_listed_fields() {
        let spec = FilterSpec::from_flags(None, Some("key,ua,nope")).unwrap();
        assert_eq!(names(&spec.project(sample())), vec!["ts", "url", "status"]);
    }

    #[test]
    fn test_names_are_not_trimmed() {
        let spec = FilterSpec::from_flags(Some("ts, url"), None).unwrap();
        assert_eq!(names(&spec.project(sample())), vec!["ts"]);
    }

    #[test]
    fn test_projection_is_idempotent() {
        for spec in [
            FilterSpec::All,
            FilterSpec::from_flags(Some("ts,url"), None).unwrap(),
            FilterSpec::from_flags(None, Some("ts,status")).unwrap(),
        ] {
            let once = spec.project(sample());
            let twice = spec.project(once.clone());
            assert_eq!(once, twice);
        }
    }
}
