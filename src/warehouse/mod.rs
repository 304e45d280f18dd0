//! Warehouse backends
//!
//! The ingest stage loads raw video rows, comment rows and the finalized
//! analysis through the `Warehouse` trait. `SqliteWarehouse` is the
//! provided implementation.

mod sqlite;
mod traits;

pub use sqlite::SqliteWarehouse;
pub use traits::{OpenWarehouse, Table, Warehouse, WarehouseError, WarehouseResult};
