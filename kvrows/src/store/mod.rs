//! Store - the key-value collaborator.
//!
//! Entries live in a single DuckDB table keyed by an order-preserving binary
//! encoding of the key path (see [`codec`]), so a prefix listing is a range
//! scan. The database can be a local file, an in-memory database, or a
//! managed MotherDuck database reached over the network.

mod codec;
mod entries;

use std::fmt;
use std::fs;
use std::path::PathBuf;

use duckdb::{params, AccessMode, Connection};
use serde_json::{Map, Value};

use crate::config::ACCESS_TOKEN_VAR;
use crate::key::KeyPath;
use crate::{Config, Error, Result};

pub use entries::Entries;

/// Where a store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// A DuckDB file on local disk.
    Local(PathBuf),
    /// A private in-memory database.
    Memory,
    /// A managed database (`md:` / `motherduck:` URL), authenticated with
    /// the token in `KVROWS_ACCESS_TOKEN`.
    Managed(String),
}

impl StoreTarget {
    /// Parse a store URL.
    ///
    /// - `:memory:` - in-memory database
    /// - `md:<db>` or `motherduck:<db>` - managed database
    /// - `file://<path>` or a bare path - local file
    pub fn parse(url: &str) -> Result<Self> {
        if url.is_empty() {
            return Err(Error::Connection {
                url: String::new(),
                reason: "empty store URL".to_string(),
            });
        }
        if url == ":memory:" {
            return Ok(StoreTarget::Memory);
        }
        if url.starts_with("md:") || url.starts_with("motherduck:") {
            return Ok(StoreTarget::Managed(url.to_string()));
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(StoreTarget::Local(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(Error::Connection {
                url: url.to_string(),
                reason: format!("unsupported URL scheme '{}'", scheme),
            });
        }
        Ok(StoreTarget::Local(PathBuf::from(url)))
    }

    /// Pick the store for a run: the explicit URL, else the configured
    /// default, else the local default store under the config root.
    pub fn resolve(url: Option<&str>, config: &Config) -> Result<Self> {
        match url
            .filter(|u| !u.is_empty())
            .or(config.default_url.as_deref())
        {
            Some(url) => Self::parse(url),
            None => Ok(StoreTarget::Local(config.local_store_path())),
        }
    }
}

impl fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreTarget::Local(path) => write!(f, "{}", path.display()),
            StoreTarget::Memory => write!(f, ":memory:"),
            StoreTarget::Managed(url) => write!(f, "{}", url),
        }
    }
}

/// An open store. The connection is closed when the store is dropped.
pub struct Store {
    conn: Connection,
    target: StoreTarget,
    page_size: usize,
    has_entries: bool,
}

impl Store {
    /// Open an existing store for reading.
    ///
    /// Local files must already exist and are opened read-only. A database
    /// without the entries table reads as an empty store.
    pub fn open(target: &StoreTarget, config: &Config) -> Result<Self> {
        let conn = connect(target, true)?;
        let has_entries = has_entries_table(&conn).map_err(|e| connection_error(target, e))?;
        tracing::debug!(store = %target, has_entries, "opened store");

        Ok(Self {
            conn,
            target: target.clone(),
            page_size: config.page_size,
            has_entries,
        })
    }

    /// Open a store for writing, creating the database and schema if needed.
    pub fn create(target: &StoreTarget, config: &Config) -> Result<Self> {
        let conn = connect(target, false)?;
        ensure_schema(&conn)?;
        tracing::debug!(store = %target, "opened store for writing");

        Ok(Self {
            conn,
            target: target.clone(),
            page_size: config.page_size,
            has_entries: true,
        })
    }

    /// A fresh, writable in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::create(&StoreTarget::Memory, &Config::with_root("."))
    }

    /// Override the listing page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn target(&self) -> &StoreTarget {
        &self.target
    }

    /// List the entries strictly under `prefix`, in key order.
    ///
    /// The entry whose key equals `prefix` is not included.
    pub fn list(&self, prefix: &KeyPath) -> Entries<'_> {
        if !self.has_entries {
            return Entries::empty(&self.conn);
        }
        Entries::new(&self.conn, prefix, self.page_size)
    }

    /// Write an entry, replacing any entry with the same key.
    ///
    /// Returns the versionstamp assigned to the write.
    pub fn set(&self, key: &KeyPath, value: &Map<String, Value>) -> Result<String> {
        let key_bytes = codec::encode(key);
        let json = serde_json::to_string(value)?;

        self.conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| -> Result<String> {
            let seq: i64 =
                self.conn
                    .query_row("SELECT nextval('kv_versionstamp')", [], |row| row.get(0))?;
            let versionstamp = format!("{:020x}", seq);
            self.conn
                .execute("DELETE FROM kv_entries WHERE key = ?", params![&key_bytes])?;
            self.conn.execute(
                "INSERT INTO kv_entries VALUES (?, ?, ?)",
                params![&key_bytes, &json, &versionstamp],
            )?;
            Ok(versionstamp)
        })();

        match result {
            Ok(versionstamp) => {
                self.conn.execute("COMMIT", [])?;
                Ok(versionstamp)
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        tracing::debug!(store = %self.target, "closing store");
    }
}

fn connect(target: &StoreTarget, read_only: bool) -> Result<Connection> {
    match target {
        StoreTarget::Memory => {
            Connection::open_in_memory().map_err(|e| connection_error(target, e))
        }
        StoreTarget::Local(path) if read_only => {
            if !path.exists() {
                return Err(connection_error(target, "no store at this path"));
            }
            let flags = duckdb::Config::default()
                .access_mode(AccessMode::ReadOnly)
                .map_err(|e| connection_error(target, e))?;
            Connection::open_with_flags(path, flags).map_err(|e| connection_error(target, e))
        }
        StoreTarget::Local(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            Connection::open(path).map_err(|e| connection_error(target, e))
        }
        StoreTarget::Managed(url) => {
            let token = std::env::var(ACCESS_TOKEN_VAR)
                .ok()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| connection_error(target, format!("{} is not set", ACCESS_TOKEN_VAR)))?;
            let separator = if url.contains('?') { '&' } else { '?' };
            let dsn = format!("{}{}motherduck_token={}", url, separator, token);
            Connection::open(&dsn)
                .map_err(|e| connection_error(target, e.to_string().replace(&token, "***")))
        }
    }
}

fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS kv_entries (
            key BLOB NOT NULL,
            value VARCHAR NOT NULL,
            versionstamp VARCHAR NOT NULL
        );
        CREATE SEQUENCE IF NOT EXISTS kv_versionstamp START 1;
        "#,
    )?;
    Ok(())
}

fn has_entries_table(conn: &Connection) -> duckdb::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'kv_entries'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn connection_error(target: &StoreTarget, reason: impl ToString) -> Error {
    Error::Connection {
        url: target.to_string(),
        reason: reason.to_string(),
    }
}
