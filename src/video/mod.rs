//! Video metadata, comments, and the sources they are fetched from

mod source;
mod types;
mod youtube;

pub use source::{SourceError, VideoSource};
pub use types::{
    Comment, CommentRecord, RunProvenance, VideoContext, VideoRecord, VideoSnapshot,
};
pub use youtube::{extract_video_id, YouTubeClient};
