//! Map-reduce analysis of a video's comments
//!
//! # Architecture
//!
//! - **Chunker**: splits the comments into fixed-size, order-preserving chunks
//! - **Dispatcher**: one concurrent worker per chunk, all sharing a token-bucket
//!   `RateLimiter` in front of the model
//! - **PartialAnalyses**: joins the workers; all-or-nothing
//! - **Reducer**: one final-report request, retried with a flat backoff
//! - **Sanitizer**: pulls the JSON object out of the model's text and decodes
//!   it strictly as an `AnalysisRecord`
//!
//! `AnalysisOrchestrator` wires these together. Every suspension point
//! (limiter wait, model call, retry sleep) honors the run's `CancellationToken`.
//!
//! # Example
//!
//! ```ignore
//! use commentlens::analysis::{AnalysisOrchestrator, CancellationToken};
//! use commentlens::llm::GeminiClient;
//!
//! let gemini = Arc::new(GeminiClient::new(api_key, "gemini-2.5-pro")?);
//! let orchestrator = AnalysisOrchestrator::new(gemini);
//! let finalized = orchestrator.analyze(&snapshot, &provenance, &CancellationToken::new()).await?;
//! store.put(&format!("{}_analyzed.json", provenance.tracking_id), finalized.json.into_bytes()).await?;
//! ```

mod aggregator;
mod cancel;
mod chunker;
mod dispatcher;
mod limiter;
mod orchestrator;
mod prompts;
pub mod record;
mod reducer;
mod sanitizer;
mod types;

pub use aggregator::PartialAnalyses;
pub use cancel::CancellationToken;
pub use chunker::{chunk_comments, Chunk};
pub use dispatcher::{ChunkOutcome, Dispatcher};
pub use limiter::RateLimiter;
pub use orchestrator::AnalysisOrchestrator;
pub use prompts::{chunk_prompt, reduce_prompt};
pub use record::AnalysisRecord;
pub use reducer::Reducer;
pub use sanitizer::{finalize, FinalizedAnalysis, SanitizeError};
pub use types::{
    AnalysisConfig, AnalysisError, COMMENT_CHUNK_SIZE, MAX_REDUCE_ATTEMPTS, RATE_INTERVAL,
    REDUCE_BACKOFF,
};
