//! Map phase: one rate-limited model call per chunk

use super::cancel::CancellationToken;
use super::chunker::Chunk;
use super::limiter::RateLimiter;
use super::prompts;
use super::types::AnalysisError;
use crate::llm::{GenerateRequest, TextGenerator};
use crate::video::VideoContext;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, Instrument};

/// What a worker hands back: its chunk index and the model's text.
pub type ChunkOutcome = (usize, Result<String, AnalysisError>);

/// Fans chunks out to concurrent workers sharing one rate limiter.
pub struct Dispatcher {
    generator: Arc<dyn TextGenerator>,
    limiter: Arc<RateLimiter>,
}

impl Dispatcher {
    pub fn new(generator: Arc<dyn TextGenerator>, limiter: Arc<RateLimiter>) -> Self {
        Self { generator, limiter }
    }

    /// Spawn one task per chunk. Errors come back tagged with the chunk index.
    ///
    /// Tasks inherit the caller's tracing span.
    pub fn dispatch(
        &self,
        video: Arc<VideoContext>,
        chunks: Vec<Chunk>,
        cancel: &CancellationToken,
    ) -> JoinSet<ChunkOutcome> {
        let total = chunks.len();
        let mut set = JoinSet::new();

        for chunk in chunks {
            let index = chunk.index;
            let worker = ChunkWorker {
                generator: self.generator.clone(),
                limiter: self.limiter.clone(),
                video: video.clone(),
                cancel: cancel.clone(),
                total,
            };
            set.spawn(
                async move {
                    let result = worker.run(chunk).await.map_err(|e| e.in_chunk(index));
                    (index, result)
                }
                .in_current_span(),
            );
        }

        set
    }
}

struct ChunkWorker {
    generator: Arc<dyn TextGenerator>,
    limiter: Arc<RateLimiter>,
    video: Arc<VideoContext>,
    cancel: CancellationToken,
    total: usize,
}

impl ChunkWorker {
    async fn run(self, chunk: Chunk) -> Result<String, AnalysisError> {
        self.limiter.acquire(&self.cancel).await?;

        let prompt = prompts::chunk_prompt(&self.video, &chunk)?;
        info!(
            chunk = chunk.index + 1,
            total = self.total,
            comments = chunk.len(),
            "Analyzing comment chunk"
        );

        let request = GenerateRequest::chunk(chunk.index, prompt);
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(AnalysisError::Cancelled),
            response = self.generator.generate(&request) => response?,
        };

        let text = response.first_text()?;
        debug!(chunk = chunk.index + 1, bytes = text.len(), "Chunk analysis received");
        Ok(text.to_string())
    }
}
