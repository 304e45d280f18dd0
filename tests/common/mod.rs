//! Shared fixtures for commentlens integration tests
//!
//! Builders for video snapshots, a scripted video source, and a complete
//! model report the sanitizer accepts.

#![allow(dead_code)]

use async_trait::async_trait;
use commentlens::{
    Comment, MemoryObjectStore, OpenWarehouse, RunProvenance, SourceError, SqliteWarehouse,
    VideoContext, VideoSnapshot, VideoSource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

pub const TEST_VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Video metadata with the counts used across the tests.
pub fn video_context(provenance: &RunProvenance) -> VideoContext {
    VideoContext {
        id: TEST_VIDEO_ID.into(),
        channel_id: "UC-test".into(),
        channel_title: "Test Channel".into(),
        tracking_id: provenance.tracking_id.clone(),
        run_date: provenance.run_date.clone(),
        title: "Restoring a 1952 tractor".into(),
        description: "Full restoration".into(),
        duration: "PT24M10S".into(),
        category_id: "2".into(),
        view_count: 1000,
        like_count: 50,
        favorite_count: 0,
        comment_count: 250,
        ..Default::default()
    }
}

/// `n` comments in source order; every fifth one is a reply.
pub fn comments(n: usize, provenance: &RunProvenance) -> Vec<Comment> {
    (0..n)
        .map(|i| Comment {
            id: format!("comment-{i:04}"),
            parent_id: (i % 5 == 4).then(|| format!("comment-{:04}", i - 1)),
            channel_id: format!("UC-viewer-{}", i % 17),
            text: format!("Comment number {i}"),
            like_count: (i % 13) as i64,
            reply_count: 0,
            tracking_id: provenance.tracking_id.clone(),
            run_date: provenance.run_date.clone(),
        })
        .collect()
}

pub fn snapshot(n_comments: usize, provenance: &RunProvenance) -> VideoSnapshot {
    VideoSnapshot::new(video_context(provenance), comments(n_comments, provenance))
}

pub fn provenance(tracking_id: &str) -> RunProvenance {
    RunProvenance::new(tracking_id, "2026-10-16")
}

/// A complete report as the model would emit it, without provenance.
pub fn valid_report_json() -> String {
    serde_json::json!({
        "executive_summary": "The restoration resonated strongly with its audience.",
        "performance_metrics": {
            "video_statistics": {"view_count": 1000, "like_count": 50, "comment_count": 250},
            "engagement_ratios": {"like_to_view_ratio": 0.05, "comment_to_view_ratio": 0.25},
            "interpretation": "Engagement is well above average."
        },
        "audience_analysis": {
            "sentiment_label": "Positive",
            "summary": "Viewers loved the detail.",
            "positive_comments": 200,
            "negative_comments": 10,
            "neutral_comments": 40,
            "audience_persona": "Hobbyist restorers."
        },
        "content_feedback": {
            "positive_feedback": [{"point": "Detail", "representative_comment": "So thorough"}],
            "constructive_criticism": [{"point": "Length", "representative_comment": "Too long"}],
            "unanswered_questions": [{"question": "Paint brand?", "representative_comment": "What paint?"}]
        },
        "key_themes": [
            {"theme_title": "Nostalgia", "summary": "Family memories.", "representative_comment": "Grandpa had one"}
        ],
        "engagement_highlights": [
            {"comment_text": "Best channel", "engagement_count": 120, "reason_for_engagement": "Community praise"}
        ],
        "swot_analysis": {
            "strengths": "Deep expertise.",
            "weaknesses": "Long runtime.",
            "opportunities": "Parts sourcing videos.",
            "threats": "Competing channels."
        },
        "actionable_recommendations": {
            "content_strategy": [{"idea": "Engine rebuild series", "reason": "Most requested"}],
            "video_improvements": [{"suggestion": "Chapters", "reason": "Long videos"}],
            "community_management": "Reply to paint questions.",
            "monetization_opportunities": [{"category": "Tools", "products": ["Parts washer"]}]
        }
    })
    .to_string()
}

/// A video source answering from a fixed snapshot.
pub struct FixedSource {
    comment_count: usize,
    pub calls: AtomicUsize,
}

impl FixedSource {
    pub fn new(comment_count: usize) -> Self {
        Self {
            comment_count,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VideoSource for FixedSource {
    async fn fetch_video_and_comments(
        &self,
        video_id: &str,
        provenance: &RunProvenance,
    ) -> Result<(VideoContext, Vec<Comment>), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if video_id != TEST_VIDEO_ID {
            return Err(SourceError::NotFound(video_id.to_string()));
        }
        Ok((
            video_context(provenance),
            comments(self.comment_count, provenance),
        ))
    }
}

/// In-memory store and warehouse pair.
pub fn memory_backends() -> (Arc<MemoryObjectStore>, Arc<SqliteWarehouse>) {
    (
        Arc::new(MemoryObjectStore::new("test-bucket")),
        Arc::new(SqliteWarehouse::open_in_memory().expect("in-memory warehouse")),
    )
}

/// Serve `router` on an ephemeral local port; returns its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
    let addr = listener.local_addr().expect("stub server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}
