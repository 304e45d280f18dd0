//! Warehouse trait definitions

use crate::analysis::AnalysisRecord;
use crate::video::{CommentRecord, VideoRecord};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during warehouse operations
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for warehouse operations
pub type WarehouseResult<T> = Result<T, WarehouseError>;

/// The warehouse tables a run loads into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Videos,
    Comments,
    Analyzed,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Videos => "videos",
            Table::Comments => "comments",
            Table::Analyzed => "analyzed",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tabular sink for run results.
///
/// Every row carries its run's tracking id; `record_exists` is the
/// idempotency check the ingest stage runs before inserting.
pub trait Warehouse: Send + Sync {
    /// Whether `table` already holds rows for `tracking_id`
    fn record_exists(&self, table: Table, tracking_id: &str) -> WarehouseResult<bool>;

    /// Insert the `videos` row and its `comments` rows in one transaction.
    ///
    /// Either everything lands or nothing does. Returns the number of
    /// comments inserted.
    fn insert_raw(
        &self,
        video: &VideoRecord,
        comments: &[CommentRecord],
    ) -> WarehouseResult<usize>;

    /// Insert one row into `analyzed`
    fn insert_analysis(&self, record: &AnalysisRecord) -> WarehouseResult<()>;
}

/// Warehouses that can be opened from a path
pub trait OpenWarehouse: Warehouse + Sized {
    /// Open or create a warehouse at the given path
    fn open(path: impl AsRef<Path>) -> WarehouseResult<Self>;

    /// Create an in-memory warehouse (useful for testing)
    fn open_in_memory() -> WarehouseResult<Self>;
}
