//! commentlens: map-reduce LLM analysis of YouTube comment sections
//!
//! Fetches a video's metadata and comments, analyzes them with a language
//! model, and loads raw and analyzed results into a warehouse.
//!
//! # Core Concepts
//!
//! - **Snapshot**: a video's metadata plus its comments, stored per run
//! - **Map phase**: comments split into chunks of 100, each analyzed
//!   concurrently behind a shared rate limiter
//! - **Reduce phase**: chunk results combined into one strictly validated
//!   `AnalysisRecord`, retried a bounded number of times
//! - **Tracking id**: correlates one video's data through fetch, analyze and ingest
//!
//! # Example
//!
//! ```
//! use commentlens::{chunk_comments, Comment};
//! use std::num::NonZeroUsize;
//!
//! let comments = vec![Comment::default(); 250];
//! let chunks = chunk_comments(&comments, NonZeroUsize::new(100).unwrap());
//! assert_eq!(chunks.len(), 3);
//! ```

pub mod analysis;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod storage;
pub mod video;
pub mod warehouse;

pub use analysis::{
    chunk_comments, AnalysisConfig, AnalysisError, AnalysisOrchestrator, AnalysisRecord,
    CancellationToken, Chunk, FinalizedAnalysis, PartialAnalyses, RateLimiter, SanitizeError,
};
pub use config::{AppConfig, ConfigError};
pub use llm::{
    GeminiClient, GenerateRequest, GenerateResponse, LlmError, MockGenerator, TextGenerator,
};
pub use pipeline::{Pipeline, PipelineError, Stage, StageReport, StageStatus};
pub use storage::{
    FsObjectStore, MemoryObjectStore, ObjectStore, StorageError, StorageResult,
};
pub use video::{
    Comment, RunProvenance, SourceError, VideoContext, VideoSnapshot, VideoSource, YouTubeClient,
};
pub use warehouse::{
    OpenWarehouse, SqliteWarehouse, Table, Warehouse, WarehouseError, WarehouseResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
