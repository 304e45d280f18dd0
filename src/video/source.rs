//! Video source trait definitions

use super::types::{Comment, RunProvenance, VideoContext};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from fetching a video and its comments.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("video not found: {0}")]
    NotFound(String),

    #[error("rate limited by video API: {0}")]
    RateLimited(String),

    #[error("video API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("invalid video reference: {0}")]
    InvalidReference(String),
}

/// Source of video metadata and comments.
///
/// Implementations paginate until exhaustion, a configured cap, or an
/// upstream quota signal. A quota signal while paging comments ends the
/// fetch early without failing it.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch_video_and_comments(
        &self,
        video_id: &str,
        provenance: &RunProvenance,
    ) -> Result<(VideoContext, Vec<Comment>), SourceError>;
}
