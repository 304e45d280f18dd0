//! Reduce phase: synthesize the final report with bounded retries

use super::aggregator::PartialAnalyses;
use super::cancel::CancellationToken;
use super::prompts;
use super::sanitizer::{self, FinalizedAnalysis};
use super::types::AnalysisError;
use crate::llm::{GenerateRequest, TextGenerator};
use crate::video::{RunProvenance, VideoContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

pub struct Reducer {
    generator: Arc<dyn TextGenerator>,
    max_attempts: usize,
    backoff: Duration,
}

impl Reducer {
    pub fn new(generator: Arc<dyn TextGenerator>, max_attempts: usize, backoff: Duration) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Run attempts until one yields a valid report.
    ///
    /// Transport, empty-response and format failures are retried after a flat
    /// backoff. Anything else, cancellation included, returns at once.
    pub async fn reduce(
        &self,
        video: &VideoContext,
        partials: &PartialAnalyses,
        provenance: &RunProvenance,
        cancel: &CancellationToken,
    ) -> Result<FinalizedAnalysis, AnalysisError> {
        let prompt = prompts::reduce_prompt(video, &partials.to_json_array())?;

        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            let err = match self.attempt(attempt, &prompt, provenance, cancel).await {
                Ok(finalized) => return Ok(finalized),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            warn!(
                attempt,
                max_attempts = self.max_attempts,
                error = %err,
                "Final analysis attempt failed"
            );
            if attempt == self.max_attempts {
                return Err(AnalysisError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
                _ = tokio::time::sleep(self.backoff) => {}
            }
        }

        Err(AnalysisError::Internal("reduction loop ended without a result".into()))
    }

    async fn attempt(
        &self,
        attempt: usize,
        prompt: &str,
        provenance: &RunProvenance,
        cancel: &CancellationToken,
    ) -> Result<FinalizedAnalysis, AnalysisError> {
        info!(attempt, max_attempts = self.max_attempts, "Generating final analysis");
        let started = Instant::now();

        let request = GenerateRequest::reduction(attempt, prompt);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            response = self.generator.generate(&request) => response?,
        };
        let raw = response.first_text()?;
        info!(attempt, elapsed = ?started.elapsed(), "Received final analysis");

        match sanitizer::finalize(raw, provenance) {
            Ok(finalized) => {
                info!(attempt, "Parsed and validated final analysis");
                Ok(finalized)
            }
            Err(e) => {
                warn!(attempt, error = %e, raw = %raw, "Model output failed validation");
                Err(e.into())
            }
        }
    }
}
