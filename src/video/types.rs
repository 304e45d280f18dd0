//! Video and comment data as fetched from the source
//!
//! These types are the persisted raw snapshot (`<tracking_id>.json`) and the
//! shared context embedded into every analysis prompt.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Correlation data assigned by the pipeline, never by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProvenance {
    pub tracking_id: String,
    /// Run date formatted as `YYYY-MM-DD`
    pub run_date: String,
}

impl RunProvenance {
    pub fn new(tracking_id: impl Into<String>, run_date: impl Into<String>) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            run_date: run_date.into(),
        }
    }

    /// Provenance stamped with today's date (UTC).
    pub fn today(tracking_id: impl Into<String>) -> Self {
        Self::new(tracking_id, Utc::now().format("%Y-%m-%d").to_string())
    }

    /// Provenance with a freshly generated tracking id.
    pub fn generate() -> Self {
        Self::today(uuid::Uuid::new_v4().to_string())
    }

    /// Today's provenance for `tracking_id`, or a generated one when it is
    /// absent or blank.
    pub fn resolve(tracking_id: Option<&str>) -> Self {
        match tracking_id.map(str::trim) {
            Some(tid) if !tid.is_empty() => Self::today(tid),
            _ => Self::generate(),
        }
    }
}

/// Metadata for one video. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoContext {
    pub id: String,
    pub channel_id: String,
    pub channel_title: String,
    pub tracking_id: String,
    pub run_date: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub duration: String,
    pub category_id: String,
    pub view_count: i64,
    pub like_count: i64,
    pub favorite_count: i64,
    pub comment_count: i64,
}

/// A single comment or reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Id of the thread's top-level comment; `None` for top-level comments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub channel_id: String,
    pub text: String,
    pub like_count: i64,
    pub reply_count: i64,
    pub tracking_id: String,
    pub run_date: String,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.as_deref().map_or(true, str::is_empty)
    }
}

/// Video metadata plus its comments, in source (relevance) order.
///
/// Serializes flat: the video fields at top level next to `comments`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSnapshot {
    #[serde(flatten)]
    pub video: VideoContext,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl VideoSnapshot {
    pub fn new(video: VideoContext, comments: Vec<Comment>) -> Self {
        Self { video, comments }
    }
}

/// Row shape for the `videos` warehouse table.
pub type VideoRecord = VideoContext;

/// Row shape for the `comments` warehouse table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub video_id: String,
    #[serde(flatten)]
    pub comment: Comment,
}

impl CommentRecord {
    pub fn for_video(video_id: &str, comment: Comment) -> Self {
        Self {
            video_id: video_id.to_string(),
            comment,
        }
    }
}
