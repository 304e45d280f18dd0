//! Joins map-phase workers and combines their fragments

use super::dispatcher::ChunkOutcome;
use super::types::AnalysisError;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Chunk-level fragments from a fully successful map phase.
///
/// Fragments are opaque model text, kept in completion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialAnalyses {
    fragments: Vec<String>,
}

impl PartialAnalyses {
    pub fn new(fragments: Vec<String>) -> Self {
        Self { fragments }
    }

    /// Wait for every worker, then succeed only if all of them did.
    ///
    /// Each failure is logged individually. A cancellation anywhere wins over
    /// the generic map-phase failure.
    pub async fn collect(mut workers: JoinSet<ChunkOutcome>) -> Result<Self, AnalysisError> {
        let mut fragments = Vec::with_capacity(workers.len());
        let mut failed = 0;
        let mut cancelled = false;

        while let Some(joined) = workers.join_next().await {
            let outcome = joined.map_err(|e| AnalysisError::Internal(e.to_string()));
            match outcome {
                Ok((_, Ok(text))) => fragments.push(text),
                Ok((index, Err(e))) => {
                    error!(chunk = index, error = %e, "Error during chunk analysis");
                    cancelled |= e.is_cancelled();
                    failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "Chunk worker did not complete");
                    failed += 1;
                }
            }
        }

        let total = fragments.len() + failed;
        if cancelled {
            return Err(AnalysisError::Cancelled);
        }
        if failed > 0 {
            return Err(AnalysisError::MapPhase { failed, total });
        }

        info!(chunks = total, "All chunks analyzed");
        Ok(Self { fragments })
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The fragments as one JSON array literal: `[f1,f2,...]`.
    pub fn to_json_array(&self) -> String {
        format!("[{}]", self.fragments.join(","))
    }
}
