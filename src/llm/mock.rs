//! Scripted text generator for tests

use super::types::{GenerateRequest, GenerateResponse, LlmError, Purpose};
use super::TextGenerator;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

type Scripted = Result<GenerateResponse, LlmError>;

#[derive(Default)]
struct Script {
    /// Consumed in order, one per call
    queue: VecDeque<Scripted>,
    /// Used once the queue is empty
    fallback: Option<Scripted>,
}

/// A call the mock received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub purpose: Purpose,
    pub index: usize,
    pub prompt: String,
    /// When the call arrived (tokio clock, so paused-time tests can assert spacing)
    pub at: Instant,
}

/// Scripted text generator.
///
/// Responses are registered per `Purpose`. A response pinned to a specific
/// request index takes precedence over the queue, and the queue over the
/// fallback. Unscripted calls fail with `LlmError::NotScripted`.
pub struct MockGenerator {
    scripts: Mutex<HashMap<Purpose, Script>>,
    pinned: HashMap<(Purpose, usize), Scripted>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Option<Duration>,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            pinned: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    fn script(self, purpose: Purpose, edit: impl FnOnce(&mut Script)) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
            edit(scripts.entry(purpose).or_default());
        }
        self
    }

    /// Answer every call for `purpose` with this text.
    pub fn with_text(self, purpose: Purpose, text: impl Into<String>) -> Self {
        let response = GenerateResponse::text(text);
        self.script(purpose, |s| s.fallback = Some(Ok(response)))
    }

    /// Answer every call for `purpose` with this response.
    pub fn with_response(self, purpose: Purpose, response: GenerateResponse) -> Self {
        self.script(purpose, |s| s.fallback = Some(Ok(response)))
    }

    /// Fail every call for `purpose` with this error.
    pub fn with_failure(self, purpose: Purpose, error: LlmError) -> Self {
        self.script(purpose, |s| s.fallback = Some(Err(error)))
    }

    /// Queue a text response for the next unanswered call for `purpose`.
    pub fn then_text(self, purpose: Purpose, text: impl Into<String>) -> Self {
        let response = GenerateResponse::text(text);
        self.script(purpose, |s| s.queue.push_back(Ok(response)))
    }

    /// Queue a response for the next unanswered call for `purpose`.
    pub fn then_response(self, purpose: Purpose, response: GenerateResponse) -> Self {
        self.script(purpose, |s| s.queue.push_back(Ok(response)))
    }

    /// Queue a failure for the next unanswered call for `purpose`.
    pub fn then_failure(self, purpose: Purpose, error: LlmError) -> Self {
        self.script(purpose, |s| s.queue.push_back(Err(error)))
    }

    /// Pin the answer for one request index (chunk index or attempt number).
    pub fn at_index(mut self, purpose: Purpose, index: usize, result: Scripted) -> Self {
        self.pinned.insert((purpose, index), result);
        self
    }

    /// Delay every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// All calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls received for `purpose`.
    pub fn call_count(&self, purpose: Purpose) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| c.purpose == purpose)
            .count()
    }

    fn next_answer(&self, request: &GenerateRequest) -> Scripted {
        if let Some(pinned) = self.pinned.get(&(request.purpose, request.index)) {
            return pinned.clone();
        }
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        let Some(script) = scripts.get_mut(&request.purpose) else {
            return Err(LlmError::NotScripted(format!(
                "no script for {:?}",
                request.purpose
            )));
        };
        if let Some(next) = script.queue.pop_front() {
            return next;
        }
        script.fallback.clone().unwrap_or_else(|| {
            Err(LlmError::NotScripted(format!(
                "script for {:?} exhausted at index {}",
                request.purpose, request.index
            )))
        })
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                purpose: request.purpose,
                index: request.index,
                prompt: request.prompt.clone(),
                at: Instant::now(),
            });

        let answer = self.next_answer(request);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        answer
    }
}
