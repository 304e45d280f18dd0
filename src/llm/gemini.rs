//! Gemini `generateContent` client

use super::types::{Candidate, GenerateRequest, GenerateResponse, LlmError, Part};
use super::TextGenerator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Harm categories whose blocking is switched off. Comment sections are
/// full of content the default filters would refuse to summarize.
const UNFILTERED_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: Vec<WireRequestContent<'a>>,
    safety_settings: Vec<WireSafetySetting>,
}

#[derive(Debug, Serialize)]
struct WireRequestContent<'a> {
    role: &'static str,
    parts: Vec<WireTextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct WireTextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct WireSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    text: Option<String>,
    inline_data: Option<WireBlob>,
    function_call: Option<WireFunctionCall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    #[serde(default)]
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    #[serde(default)]
    name: String,
}

impl From<WirePart> for Part {
    fn from(part: WirePart) -> Self {
        if let Some(text) = part.text {
            Part::Text(text)
        } else if let Some(blob) = part.inline_data {
            Part::InlineData {
                mime_type: blob.mime_type,
            }
        } else if let Some(call) = part.function_call {
            Part::FunctionCall { name: call.name }
        } else {
            Part::InlineData {
                mime_type: String::new(),
            }
        }
    }
}

impl From<WireResponse> for GenerateResponse {
    fn from(wire: WireResponse) -> Self {
        let candidates = wire
            .candidates
            .into_iter()
            .map(|c| Candidate {
                parts: c
                    .content
                    .map(|content| content.parts.into_iter().map(Part::from).collect())
                    .unwrap_or_default(),
            })
            .collect();
        GenerateResponse { candidates }
    }
}

/// Reqwest-backed Gemini client.
pub struct GeminiClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            http,
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn body(prompt: &str) -> WireRequest<'_> {
        WireRequest {
            contents: vec![WireRequestContent {
                role: "user",
                parts: vec![WireTextPart { text: prompt }],
            }],
            safety_settings: UNFILTERED_CATEGORIES
                .iter()
                .map(|&category| WireSafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(
            model = %self.model,
            purpose = ?request.purpose,
            index = request.index,
            prompt_bytes = request.prompt.len(),
            "Gemini generate request"
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::body(&request.prompt))
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        Ok(wire.into())
    }
}
