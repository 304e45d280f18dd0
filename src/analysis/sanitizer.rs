//! Extracts and validates the report embedded in raw model output
//!
//! Models wrap their JSON in prose or markdown fences. The object is taken
//! from the first `{` to the last `}`; inside that slice only the first
//! complete JSON value is decoded, so trailing braces in commentary after
//! the report do not break it.

use super::record::AnalysisRecord;
use crate::video::RunProvenance;
use thiserror::Error;

/// Longest excerpt of model output carried in an error message.
const EXCERPT_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("no JSON object found in response: {excerpt}")]
    NoJsonObject { excerpt: String },

    #[error("JSON does not match the report shape: {message}")]
    Decode { message: String },
}

/// A validated report and its serialized form.
#[derive(Debug, Clone)]
pub struct FinalizedAnalysis {
    pub record: AnalysisRecord,
    pub json: String,
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Slice from the first `{` to the last `}` inclusive.
fn json_object_span(raw: &str) -> Result<&str, SanitizeError> {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&raw[start..=end]),
        _ => Err(SanitizeError::NoJsonObject {
            excerpt: excerpt(raw),
        }),
    }
}

/// Decode `raw` as an `AnalysisRecord`, stamp it with `provenance`, and
/// re-serialize it.
pub fn finalize(raw: &str, provenance: &RunProvenance) -> Result<FinalizedAnalysis, SanitizeError> {
    let span = json_object_span(raw)?;

    let mut record = serde_json::Deserializer::from_str(span)
        .into_iter::<AnalysisRecord>()
        .next()
        .ok_or_else(|| SanitizeError::NoJsonObject {
            excerpt: excerpt(raw),
        })?
        .map_err(|e| SanitizeError::Decode {
            message: e.to_string(),
        })?;

    record.tracking_id = provenance.tracking_id.clone();
    record.run_date = provenance.run_date.clone();

    let json = serde_json::to_string(&record).map_err(|e| SanitizeError::Decode {
        message: e.to_string(),
    })?;
    Ok(FinalizedAnalysis { record, json })
}
