//! Analysis orchestrator: map-reduce over a video's comments
//!
//! Chunks the comments, analyzes the chunks concurrently under a shared
//! rate limit, then reduces the fragments into one validated report.

use super::aggregator::PartialAnalyses;
use super::cancel::CancellationToken;
use super::chunker::chunk_comments;
use super::dispatcher::Dispatcher;
use super::limiter::RateLimiter;
use super::reducer::Reducer;
use super::sanitizer::FinalizedAnalysis;
use super::types::{AnalysisConfig, AnalysisError};
use crate::llm::TextGenerator;
use crate::video::{RunProvenance, VideoSnapshot};
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// Runs the full analysis for one video snapshot.
pub struct AnalysisOrchestrator {
    generator: Arc<dyn TextGenerator>,
    config: AnalysisConfig,
}

impl AnalysisOrchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            config: AnalysisConfig::new(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `snapshot` and return the finalized report.
    ///
    /// The map phase fails as a unit: one failed chunk fails the run. An
    /// empty comment set still goes through reduction with `[]`.
    pub async fn analyze(
        &self,
        snapshot: &VideoSnapshot,
        provenance: &RunProvenance,
        cancel: &CancellationToken,
    ) -> Result<FinalizedAnalysis, AnalysisError> {
        if provenance.tracking_id.trim().is_empty() {
            let err = AnalysisError::Validation("missing tracking id".into());
            error!(video_id = %snapshot.video.id, error = %err, "Rejected analysis request");
            return Err(err);
        }

        let span = info_span!("analysis", tracking_id = %provenance.tracking_id);
        async {
            let result = self.run(snapshot, provenance, cancel).await;
            if let Err(e) = &result {
                error!(error = %e, "Analysis failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        snapshot: &VideoSnapshot,
        provenance: &RunProvenance,
        cancel: &CancellationToken,
    ) -> Result<FinalizedAnalysis, AnalysisError> {
        let chunks = chunk_comments(&snapshot.comments, self.config.chunk_size);
        info!(
            video_id = %snapshot.video.id,
            comments = snapshot.comments.len(),
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size.get(),
            "Split comments into chunks"
        );

        // One limiter per run
        let limiter = Arc::new(RateLimiter::new(
            self.config.rate_interval,
            self.config.rate_burst,
        ));
        let video = Arc::new(snapshot.video.clone());
        let workers = Dispatcher::new(self.generator.clone(), limiter).dispatch(
            video.clone(),
            chunks,
            cancel,
        );
        let partials = PartialAnalyses::collect(workers).await?;

        info!(fragments = partials.len(), "Starting final reduction");
        Reducer::new(
            self.generator.clone(),
            self.config.max_attempts,
            self.config.retry_backoff,
        )
        .reduce(&video, &partials, provenance, cancel)
        .await
    }
}
