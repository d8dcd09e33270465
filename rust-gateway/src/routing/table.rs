//! Routing table: `custom_id` keys mapped to n8n webhook ids.
//!
//! The table lives in a JSON file that operators edit while the gateway runs.
//! [`FileRoutingTable`] keeps a parsed snapshot plus the file's modification
//! time and only re-reads the file when that time changes. A bad edit never
//! replaces a good snapshot.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::SystemTime;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

/// One value in the routing table.
///
/// Either a bare webhook id (always PROD) or a record with an environment
/// and an id. The id may be spelled `id` or `uuid`. Record fields are read
/// independently, so a field of the wrong type only drops that field.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingEntry {
    Id(String),
    Record(RoutingRecord),
    /// Any other JSON value. Never resolves.
    Unsupported(Value),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingRecord {
    /// From `env`, or `environment` when `env` is not a string.
    pub env: Option<String>,
    pub id: Option<String>,
    pub uuid: Option<String>,
}

impl RoutingRecord {
    fn from_map(map: &Map<String, Value>) -> Self {
        let string = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            env: string("env").or_else(|| string("environment")),
            id: string("id"),
            uuid: string("uuid"),
        }
    }
}

impl From<Value> for RoutingEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::String(id) => Self::Id(id),
            Value::Object(map) => Self::Record(RoutingRecord::from_map(&map)),
            other => Self::Unsupported(other),
        }
    }
}

/// Immutable snapshot of the routing table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingTable {
    entries: HashMap<String, RoutingEntry>,
}

impl RoutingTable {
    pub fn new(entries: HashMap<String, RoutingEntry>) -> Self {
        Self { entries }
    }

    /// Parse a table from JSON text. The root must be an object.
    pub fn from_json(raw: &str) -> Result<Self, RoutingTableError> {
        let root: Value = serde_json::from_str(raw)?;
        let Value::Object(map) = root else {
            return Err(RoutingTableError::NotAnObject);
        };

        Ok(Self {
            entries: map.into_iter().map(|(key, value)| (key, value.into())).collect(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&RoutingEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reasons a routing table refresh failed.
#[derive(Debug, Error)]
pub enum RoutingTableError {
    #[error("failed to read routing table: {0}")]
    Read(#[from] io::Error),

    #[error("invalid routing table JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("root of routing table JSON must be an object")]
    NotAnObject,
}

/// Source of the current routing table.
pub trait RoutingTableProvider: Send + Sync {
    /// Return the current snapshot, refreshing it first if the source changed.
    fn current(&self) -> Arc<RoutingTable>;
}

/// A table that never changes.
#[derive(Debug, Clone, Default)]
pub struct StaticRoutingTable {
    table: Arc<RoutingTable>,
}

impl StaticRoutingTable {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }
}

impl RoutingTableProvider for StaticRoutingTable {
    fn current(&self) -> Arc<RoutingTable> {
        Arc::clone(&self.table)
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    table: Arc<RoutingTable>,
    /// Modification time of the file the table was parsed from.
    modified: Option<SystemTime>,
    /// Set once any load succeeded, to tell first loads from reloads.
    loaded_once: bool,
}

/// Routing table backed by a JSON file, re-read when its mtime changes.
#[derive(Debug)]
pub struct FileRoutingTable {
    path: PathBuf,
    snapshot: RwLock<Snapshot>,
    /// Serializes refreshes so only one caller parses a changed file.
    refresh_lock: Mutex<()>,
}

impl FileRoutingTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: RwLock::new(Snapshot::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    fn cached(&self) -> (Arc<RoutingTable>, Option<SystemTime>) {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        (Arc::clone(&snapshot.table), snapshot.modified)
    }

    fn refresh(&self) -> Arc<RoutingTable> {
        let _guard = self.refresh_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let modified = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.mark_missing(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "routing_table_load_error");
                return self.cached().0;
            }
        };

        // Double-check after acquiring the refresh lock
        let (table, cached_modified) = self.cached();
        if cached_modified == Some(modified) {
            return table;
        }

        match load(&self.path) {
            Ok(table) => {
                let table = Arc::new(table);
                let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
                let reload = snapshot.loaded_once;
                snapshot.table = Arc::clone(&table);
                snapshot.modified = Some(modified);
                snapshot.loaded_once = true;
                drop(snapshot);

                if reload {
                    info!(path = %self.path.display(), entries = table.len(), "routing_table_reloaded");
                } else {
                    info!(path = %self.path.display(), entries = table.len(), "routing_table_loaded");
                }
                table
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "routing_table_load_error");
                table
            }
        }
    }

    fn mark_missing(&self) -> Arc<RoutingTable> {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        if snapshot.modified.is_some() {
            warn!(path = %self.path.display(), "routing_table_missing");
        }
        snapshot.table = Arc::new(RoutingTable::default());
        snapshot.modified = None;
        Arc::clone(&snapshot.table)
    }
}

impl RoutingTableProvider for FileRoutingTable {
    fn current(&self) -> Arc<RoutingTable> {
        let (table, cached_modified) = self.cached();

        match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) if cached_modified == Some(modified) => table,
            _ => self.refresh(),
        }
    }
}

fn load(path: &Path) -> Result<RoutingTable, RoutingTableError> {
    let raw = fs::read_to_string(path)?;
    RoutingTable::from_json(&raw)
}
