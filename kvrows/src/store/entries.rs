//! Lazy, paginated listing of entries under a prefix.

use std::collections::VecDeque;

use duckdb::{params, Connection};
use serde_json::Value;

use super::codec;
use crate::key::KeyPath;
use crate::schema::RawEntry;
use crate::{Error, Result};

/// Where the next page starts.
#[derive(Debug)]
enum Cursor {
    /// At this key, inclusive (first page).
    At(Vec<u8>),
    /// Just after the last key already returned.
    After(Vec<u8>),
}

/// Forward-only iterator over the entries under a prefix, in key order.
///
/// Pages of `page_size` rows are fetched on demand. The first error ends
/// the iteration.
pub struct Entries<'a> {
    conn: &'a Connection,
    cursor: Cursor,
    end: Vec<u8>,
    page_size: usize,
    buffer: VecDeque<RawEntry>,
    exhausted: bool,
}

impl<'a> Entries<'a> {
    pub(super) fn new(conn: &'a Connection, prefix: &KeyPath, page_size: usize) -> Self {
        let (start, end) = codec::prefix_range(prefix);
        Self {
            conn,
            cursor: Cursor::At(start),
            end,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// An iterator that yields nothing (store without an entries table).
    pub(super) fn empty(conn: &'a Connection) -> Self {
        Self {
            conn,
            cursor: Cursor::At(Vec::new()),
            end: Vec::new(),
            page_size: 1,
            buffer: VecDeque::new(),
            exhausted: true,
        }
    }

    fn fetch_page(&mut self) -> Result<()> {
        let (op, from) = match &self.cursor {
            Cursor::At(key) => (">=", key),
            Cursor::After(key) => (">", key),
        };
        let sql = format!(
            "SELECT key, value, versionstamp FROM kv_entries \
             WHERE key {} ? AND key < ? ORDER BY key LIMIT {}",
            op, self.page_size
        );

        let mut stmt = self.conn.prepare(&sql).map_err(stream_error)?;
        let rows = stmt
            .query_map(params![from, &self.end], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(stream_error)?
            .collect::<duckdb::Result<Vec<(Vec<u8>, String, String)>>>()
            .map_err(stream_error)?;

        tracing::debug!(rows = rows.len(), page_size = self.page_size, "fetched page");

        if rows.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some((last, _, _)) = rows.last() {
            self.cursor = Cursor::After(last.clone());
        }

        for (key_bytes, value, versionstamp) in rows {
            self.buffer.push_back(decode_row(&key_bytes, &value, versionstamp)?);
        }
        Ok(())
    }
}

fn stream_error(e: duckdb::Error) -> Error {
    Error::Stream(e.to_string())
}

fn decode_row(key_bytes: &[u8], value: &str, versionstamp: String) -> Result<RawEntry> {
    let key = codec::decode(key_bytes)?;
    match serde_json::from_str::<Value>(value) {
        Ok(Value::Object(map)) => Ok(RawEntry::new(key, map, versionstamp)),
        Ok(other) => Err(Error::InvalidEntry {
            key: key.to_string(),
            reason: format!("value is not a mapping: {}", other),
        }),
        Err(e) => Err(Error::InvalidEntry {
            key: key.to_string(),
            reason: format!("value is not valid JSON: {}", e),
        }),
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                self.buffer.clear();
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
