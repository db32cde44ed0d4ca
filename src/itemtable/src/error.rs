//! Error types for catalog loading.
//!
//! Row-level problems (`RowError`) never escape a load pass; they are
//! collected into the summary and the offending row is skipped. Only
//! `SourceError` can fail a pass, and the catalog surfaces it as
//! `CatalogError`.

use std::fmt;

/// The row source could not produce a row set at all
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Row source unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed on {table}: {message}")]
    Query { table: String, message: String },

    #[error("No item tables found (expected `items` or `etc_items`/`weapons`/`armors`)")]
    NoTables,
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for SourceError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// A raw token with no entry in the normalizer's tables
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Item {item_id}: no mapping for {field} token {token:?}")]
pub struct MissingMapping {
    pub item_id: i64,
    pub field: &'static str,
    pub token: String,
}

/// One row could not be turned into a template
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("Missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("Column `{0}` is NULL")]
    NullValue(&'static str),

    #[error("Column `{column}` has unexpected value {found}")]
    TypeMismatch { column: &'static str, found: String },

    #[error("Column `{column}` value {value} is out of range")]
    OutOfRange { column: &'static str, value: i64 },

    #[error("Item id {0} is reserved")]
    ReservedId(i64),

    #[error(transparent)]
    Mapping(#[from] MissingMapping),
}

/// Failure of a whole load or reload
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Initial item load failed: {0}")]
    InitialLoad(#[source] SourceError),

    #[error("Reload failed, previous snapshot kept: {0}")]
    ReloadFailed(#[source] SourceError),

    #[error("A reload is already in progress")]
    ReloadInProgress,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Normalizer overrides that name something unknown
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Accessory fallback {0:?} is not an accessory slot (ring, amulet, earring, belt)")]
    AccessoryFallback(String),

    #[error("Override for item {item_id} names unknown consumable kind {kind:?}")]
    OverrideKind { item_id: i64, kind: String },
}

/// Result type for row source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for reading a single row
pub type RowResult<T> = Result<T, RowError>;

/// A row that was dropped during a build pass
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub table: String,
    /// Item id, when it could be read
    pub item_id: Option<i64>,
    /// Item name, when it could be read
    pub name: Option<String>,
    pub error: RowError,
}

impl fmt::Display for SkippedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)?;
        match (self.item_id, &self.name) {
            (Some(id), Some(name)) => write!(f, " [{} {}]", id, name)?,
            (Some(id), None) => write!(f, " [{}]", id)?,
            _ => {}
        }
        write!(f, ": {}", self.error)
    }
}
