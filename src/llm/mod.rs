//! Text generation: the model-call seam used by the analysis pipeline
//!
//! Defines the generator trait and response types. Two implementations:
//! - `GeminiClient`: calls the Gemini `generateContent` REST endpoint (production)
//! - `MockGenerator`: returns scripted responses (testing)
//!
//! Generators are shared across concurrent map-phase workers, so they must be
//! `Send + Sync` and safe to call from many tasks at once.

mod gemini;
mod mock;
mod types;

pub use gemini::GeminiClient;
pub use mock::{MockGenerator, RecordedCall};
pub use types::{
    Candidate, CandidateError, GenerateRequest, GenerateResponse, LlmError, Part, Purpose,
};

use async_trait::async_trait;

/// Client trait for calling a text-generation model.
///
/// Abstracts over transport (HTTP, mock) so the orchestrator doesn't
/// depend on how the model is reached.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Issue one generation request.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError>;
}
