//! YouTube and Gemini clients against local stub servers

mod common;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use commentlens::{
    GeminiClient, GenerateRequest, LlmError, SourceError, TextGenerator, VideoSource,
    YouTubeClient,
};
use common::{provenance, serve};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// YouTube stub
// ---------------------------------------------------------------------------

/// Serves one video and a fixed sequence of comment pages.
#[derive(Clone)]
struct YouTubeStub {
    pages: Arc<Vec<(StatusCode, Value)>>,
    page_tokens: Arc<Mutex<Vec<Option<String>>>>,
}

impl YouTubeStub {
    fn new(pages: Vec<(StatusCode, Value)>) -> Self {
        Self {
            pages: Arc::new(pages),
            page_tokens: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn page_tokens(&self) -> Vec<Option<String>> {
        self.page_tokens.lock().unwrap().clone()
    }

    async fn start(&self) -> YouTubeClient {
        self.start_with_cap(5000).await
    }

    async fn start_with_cap(&self, max_comments: usize) -> YouTubeClient {
        let router = Router::new()
            .route("/videos", get(videos))
            .route("/commentThreads", get(comment_threads))
            .with_state(self.clone());
        YouTubeClient::new("yt-key", max_comments).with_base_url(&serve(router).await)
    }
}

async fn videos(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    if query.get("id").map(String::as_str) == Some("missing") {
        return Json(json!({"items": []}));
    }
    Json(json!({
        "items": [{
            "id": "vid-1",
            "snippet": {"channelId": "UC-owner", "channelTitle": "Owner", "title": "Title"},
            "contentDetails": {"duration": "PT3M"},
            "statistics": {"viewCount": "1000", "likeCount": "50", "commentCount": "4"}
        }]
    }))
}

async fn comment_threads(
    State(stub): State<YouTubeStub>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let served = {
        let mut tokens = stub.page_tokens.lock().unwrap();
        tokens.push(query.get("pageToken").cloned());
        tokens.len() - 1
    };
    let (status, body) = stub
        .pages
        .get(served)
        .cloned()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, json!({"unexpected": served})));
    (status, Json(body))
}

fn thread(id: &str, replies: &[&str]) -> Value {
    let replies: Vec<Value> = replies
        .iter()
        .map(|r| json!({"id": r, "snippet": {"textDisplay": format!("reply {r}")}}))
        .collect();
    json!({
        "snippet": {
            "topLevelComment": {
                "id": id,
                "snippet": {"textDisplay": format!("comment {id}"), "likeCount": 2}
            },
            "totalReplyCount": replies.len()
        },
        "replies": {"comments": replies}
    })
}

fn page(threads: Vec<Value>, next: Option<&str>) -> (StatusCode, Value) {
    let mut body = json!({"items": threads});
    if let Some(token) = next {
        body["nextPageToken"] = json!(token);
    }
    (StatusCode::OK, body)
}

fn quota_exceeded() -> (StatusCode, Value) {
    (
        StatusCode::FORBIDDEN,
        json!({"error": {
            "code": 403,
            "message": "The request cannot be completed because you have exceeded your quota.",
            "errors": [{"reason": "quotaExceeded"}]
        }}),
    )
}

fn ids(comments: &[commentlens::Comment]) -> Vec<&str> {
    comments.iter().map(|c| c.id.as_str()).collect()
}

// --- Scenario: paging ---

#[tokio::test]
async fn quota_mid_paging_keeps_fetched_comments() {
    let stub = YouTubeStub::new(vec![
        page(vec![thread("a", &["a.1"]), thread("b", &[])], Some("p2")),
        quota_exceeded(),
    ]);
    let client = stub.start().await;
    let prov = provenance("tid-quota");

    let (video, comments) = client
        .fetch_video_and_comments("vid-1", &prov)
        .await
        .unwrap();

    assert_eq!(video.view_count, 1000);
    assert_eq!(video.tracking_id, "tid-quota");
    assert_eq!(ids(&comments), vec!["a", "a.1", "b"]);
    assert_eq!(comments[1].parent_id.as_deref(), Some("a"));
    assert_eq!(comments[1].channel_id, "UC-owner");
    assert_eq!(stub.page_tokens(), vec![None, Some("p2".to_string())]);
}

#[tokio::test]
async fn follows_page_tokens_until_the_last_page() {
    let stub = YouTubeStub::new(vec![
        page(vec![thread("a", &[])], Some("p2")),
        page(vec![thread("b", &["b.1"])], Some("p3")),
        page(vec![thread("c", &[])], None),
    ]);
    let client = stub.start().await;

    let (_, comments) = client
        .fetch_video_and_comments("vid-1", &provenance("tid-pages"))
        .await
        .unwrap();

    assert_eq!(ids(&comments), vec!["a", "b", "b.1", "c"]);
    assert_eq!(
        stub.page_tokens(),
        vec![None, Some("p2".to_string()), Some("p3".to_string())]
    );
}

#[tokio::test]
async fn cap_truncates_exactly_across_pages() {
    let stub = YouTubeStub::new(vec![
        page(vec![thread("a", &[]), thread("b", &[])], Some("p2")),
        page(vec![thread("c", &["c.1", "c.2"]), thread("d", &[])], Some("p3")),
        page(vec![thread("e", &[])], None),
    ]);
    let client = stub.start_with_cap(4).await;

    let (_, comments) = client
        .fetch_video_and_comments("vid-1", &provenance("tid-cap"))
        .await
        .unwrap();

    assert_eq!(ids(&comments), vec!["a", "b", "c", "c.1"]);
    assert_eq!(stub.page_tokens().len(), 2);
}

// --- Scenario: failures ---

#[tokio::test]
async fn server_error_while_paging_fails_the_fetch() {
    let stub = YouTubeStub::new(vec![(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": {
            "code": 500,
            "message": "backend error",
            "errors": [{"reason": "backendError"}]
        }}),
    )]);
    let client = stub.start().await;

    let err = client
        .fetch_video_and_comments("vid-1", &provenance("tid-500"))
        .await
        .unwrap_err();

    assert!(matches!(err, SourceError::Api { status: 500, .. }));
}

#[tokio::test]
async fn unknown_video_is_not_found() {
    let stub = YouTubeStub::new(vec![]);
    let client = stub.start().await;

    let err = client
        .fetch_video_and_comments("missing", &provenance("tid-missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, SourceError::NotFound(id) if id == "missing"));
    assert!(stub.page_tokens().is_empty());
}

// ---------------------------------------------------------------------------
// Gemini stub
// ---------------------------------------------------------------------------

async fn generate_content(
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if query.get("key").map(String::as_str) != Some("gm-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }
    if action.starts_with("overloaded") {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"code": 503, "message": "The model is overloaded."}})),
        );
    }
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{"content": {"parts": [{"text": format!("echo: {prompt}")}]}}]
        })),
    )
}

async fn gemini(model: &str) -> GeminiClient {
    let router = Router::new().route("/models/{action}", post(generate_content));
    GeminiClient::new("gm-key", model)
        .unwrap()
        .with_base_url(&serve(router).await)
}

#[tokio::test]
async fn gemini_returns_candidate_text() {
    let client = gemini("gemini-test").await;

    let response = client
        .generate(&GenerateRequest::chunk(0, "analyze these"))
        .await
        .unwrap();

    assert_eq!(response.first_text().unwrap(), "echo: analyze these");
}

#[tokio::test]
async fn gemini_non_success_status_is_an_api_error() {
    let client = gemini("overloaded-model").await;

    let err = client
        .generate(&GenerateRequest::reduction(1, "final report"))
        .await
        .unwrap_err();

    match err {
        LlmError::Api { status, body } => {
            assert_eq!(status, 503);
            assert!(body.contains("overloaded"));
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}
