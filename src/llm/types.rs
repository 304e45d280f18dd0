//! Request and response types shared by all text generators

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which step of the analysis a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Map phase: one comment chunk
    ChunkAnalysis,
    /// Reduce phase: the final report
    Reduction,
}

/// A single prompt sent to the model.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub purpose: Purpose,
    /// Chunk index (map phase) or attempt number (reduce phase)
    pub index: usize,
    pub prompt: String,
}

impl GenerateRequest {
    pub fn chunk(index: usize, prompt: impl Into<String>) -> Self {
        Self {
            purpose: Purpose::ChunkAnalysis,
            index,
            prompt: prompt.into(),
        }
    }

    pub fn reduction(attempt: usize, prompt: impl Into<String>) -> Self {
        Self {
            purpose: Purpose::Reduction,
            index: attempt,
            prompt: prompt.into(),
        }
    }
}

/// One part of a candidate's content.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String },
    FunctionCall { name: String },
}

impl Part {
    fn kind(&self) -> &'static str {
        match self {
            Part::Text(_) => "text",
            Part::InlineData { .. } => "inline_data",
            Part::FunctionCall { .. } => "function_call",
        }
    }
}

/// One generated candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub parts: Vec<Part>,
}

/// Model response: zero or more candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// A response with a single candidate holding one text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                parts: vec![Part::Text(text.into())],
            }],
        }
    }

    /// A response with no candidates at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The first text part of the first candidate.
    pub fn first_text(&self) -> Result<&str, CandidateError> {
        let candidate = self.candidates.first().ok_or(CandidateError::NoCandidates)?;
        match candidate.parts.first() {
            None => Err(CandidateError::NoParts),
            Some(Part::Text(text)) => Ok(text),
            Some(other) => Err(CandidateError::NotText(other.kind())),
        }
    }
}

/// Why a response carried no usable text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    #[error("response has no candidates")]
    NoCandidates,
    #[error("first candidate has no parts")]
    NoParts,
    #[error("first part is not text ({0})")]
    NotText(&'static str),
}

/// Errors from a text generator call.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("model API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("response decode error: {0}")]
    Decode(String),
    #[error("no scripted response: {0}")]
    NotScripted(String),
}
