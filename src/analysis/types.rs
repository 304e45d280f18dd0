//! Core types for the comment analysis pipeline

use crate::llm::{CandidateError, LlmError};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Comments per map-phase chunk.
pub const COMMENT_CHUNK_SIZE: usize = 100;

/// Minimum spacing between two model requests in the map phase.
pub const RATE_INTERVAL: Duration = Duration::from_millis(600);

/// Reduction attempts before giving up.
pub const MAX_REDUCE_ATTEMPTS: usize = 3;

/// Flat delay between reduction attempts.
pub const REDUCE_BACKOFF: Duration = Duration::from_secs(2);

/// Run-wide analysis settings.
///
/// Fixed for the lifetime of a run; every chunk and attempt sees the same values.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub chunk_size: NonZeroUsize,
    pub rate_interval: Duration,
    /// Requests the limiter lets through without waiting
    pub rate_burst: u32,
    pub max_attempts: usize,
    pub retry_backoff: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self {
            chunk_size: NonZeroUsize::new(COMMENT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
            rate_interval: RATE_INTERVAL,
            rate_burst: 1,
            max_attempts: MAX_REDUCE_ATTEMPTS,
            retry_backoff: REDUCE_BACKOFF,
        }
    }

    pub fn with_chunk_size(mut self, size: NonZeroUsize) -> Self {
        self.chunk_size = size;
        self
    }
}

/// Error types for analysis
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("model request failed: {0}")]
    Transport(#[from] LlmError),

    #[error("empty model response: {0}")]
    EmptyResponse(#[from] CandidateError),

    #[error("unusable model output: {0}")]
    Format(#[from] super::sanitizer::SanitizeError),

    #[error("analysis cancelled")]
    Cancelled,

    #[error("chunk {index}: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: Box<AnalysisError>,
    },

    #[error("{failed} of {total} chunks failed analysis")]
    MapPhase { failed: usize, total: usize },

    #[error("reduction failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: Box<AnalysisError>,
    },

    #[error("prompt error: {0}")]
    Prompt(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Tag an error with the chunk it came from.
    pub fn in_chunk(self, index: usize) -> Self {
        AnalysisError::Chunk {
            index,
            source: Box::new(self),
        }
    }

    /// Whether the reduce phase may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Transport(_)
                | AnalysisError::EmptyResponse(_)
                | AnalysisError::Format(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            AnalysisError::Cancelled => true,
            AnalysisError::Chunk { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}
