//! kvrows: key-value entries to rows.
//!
//! Lists entries under a key prefix from a DuckDB-backed key-value store and
//! reshapes each one into a flat, display-ready record.

pub mod config;
pub mod error;
pub mod filter;
pub mod key;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod store;

pub use config::{Config, ACCESS_TOKEN_VAR};
pub use error::{Error, Result};
pub use filter::FilterSpec;
pub use key::{parse_prefix, KeyPath, KeySegment};
pub use normalize::{decode_uri, normalize};
pub use pipeline::{collect_rows, run_query};
pub use render::{render, OutputFormat};
pub use schema::{FlatRecord, RawEntry};
pub use store::{Entries, Store, StoreTarget};
