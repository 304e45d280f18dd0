//! Object storage for run artifacts
//!
//! Each run writes two objects keyed by its tracking id: the raw video
//! snapshot (`<tid>.json`) and the finalized analysis (`<tid>_analyzed.json`).
//! `FsObjectStore` keeps them on disk; `MemoryObjectStore` is for tests.

mod fs;
mod memory;
mod traits;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use traits::{
    analyzed_key, get_json, put_json, raw_key, ObjectStore, StorageError, StorageResult,
};
