//! Query driver: stream entries, normalize and project each one, collect rows.

use crate::filter::FilterSpec;
use crate::key::KeyPath;
use crate::normalize::normalize;
use crate::schema::{FlatRecord, RawEntry};
use crate::store::Store;
use crate::Result;

/// Drain `entries` into display rows.
///
/// Entries are processed one at a time in delivery order. The first error,
/// whether from the stream itself or from normalizing an entry, aborts the
/// run and discards every row collected so far.
pub fn collect_rows<I>(entries: I, filter: &FilterSpec) -> Result<Vec<FlatRecord>>
where
    I: IntoIterator<Item = Result<RawEntry>>,
{
    let mut rows = Vec::new();
    for entry in entries {
        let entry = entry?;
        rows.push(filter.project(normalize(&entry)?));
    }
    Ok(rows)
}

/// List everything under `prefix` in `store` and turn it into rows.
pub fn run_query(store: &Store, prefix: &KeyPath, filter: &FilterSpec) -> Result<Vec<FlatRecord>> {
    tracing::debug!(store = %store.target(), %prefix, ?filter, "running query");
    let rows = collect_rows(store.list(prefix), filter)?;
    tracing::info!(rows = rows.len(), %prefix, "query complete");
    Ok(rows)
}
