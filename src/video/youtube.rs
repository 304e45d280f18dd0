//! YouTube Data API v3 client
//!
//! Fetches video details and pages through comment threads ordered by
//! relevance. Replies are flattened directly after their parent. Fetching
//! stops at the last page, at the configured comment cap, or when the API
//! reports `quotaExceeded` (in which case the comments gathered so far are
//! kept).

use super::source::{SourceError, VideoSource};
use super::types::{Comment, RunProvenance, VideoContext};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: u32 = 100;

/// Extract a video id from a bare id or a YouTube URL.
///
/// Accepts `youtube.com/watch?v=<id>` and `youtu.be/<id>` forms.
pub fn extract_video_id(input: &str) -> Result<String, SourceError> {
    let input = input.trim();
    match url::Url::parse(input) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            if host.contains("youtube.com") {
                if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "v") {
                    if !v.is_empty() {
                        return Ok(v.into_owned());
                    }
                }
            }
            if host.contains("youtu.be") {
                let id = parsed.path().trim_start_matches('/');
                if !id.is_empty() {
                    return Ok(id.to_string());
                }
            }
            Err(SourceError::InvalidReference(format!(
                "could not find video ID in URL: {}",
                input
            )))
        }
        Err(_) if !input.is_empty() && !input.contains('/') => Ok(input.to_string()),
        Err(e) => Err(SourceError::InvalidReference(format!(
            "invalid URL '{}': {}",
            input, e
        ))),
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Counts arrive as decimal strings; absent counts (e.g. hidden likes) are 0.
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Raw::Number(n)) => Ok(n),
        Some(Raw::Text(s)) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    content_details: ContentDetails,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category_id: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    standard: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    #[serde(default, deserialize_with = "count")]
    view_count: i64,
    #[serde(default, deserialize_with = "count")]
    like_count: i64,
    #[serde(default, deserialize_with = "count")]
    favorite_count: i64,
    #[serde(default, deserialize_with = "count")]
    comment_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadListResponse {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: ThreadSnippet,
    #[serde(default)]
    replies: Option<ThreadReplies>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: ApiComment,
    #[serde(default)]
    total_reply_count: i64,
}

#[derive(Debug, Deserialize)]
struct ThreadReplies {
    #[serde(default)]
    comments: Vec<ApiComment>,
}

#[derive(Debug, Deserialize)]
struct ApiComment {
    id: String,
    snippet: ApiCommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCommentSnippet {
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    author_channel_id: Option<AuthorChannel>,
}

#[derive(Debug, Deserialize)]
struct AuthorChannel {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorReason {
    #[serde(default)]
    reason: String,
}

fn video_from_item(item: VideoItem, provenance: &RunProvenance) -> VideoContext {
    let thumbnails = item.snippet.thumbnails;
    let thumbnail_url = thumbnails
        .maxres
        .or(thumbnails.standard)
        .or(thumbnails.high)
        .map(|t| t.url)
        .unwrap_or_default();

    VideoContext {
        id: item.id,
        channel_id: item.snippet.channel_id,
        channel_title: item.snippet.channel_title,
        tracking_id: provenance.tracking_id.clone(),
        run_date: provenance.run_date.clone(),
        title: item.snippet.title,
        description: item.snippet.description,
        thumbnail_url,
        duration: item.content_details.duration,
        category_id: item.snippet.category_id,
        view_count: item.statistics.view_count,
        like_count: item.statistics.like_count,
        favorite_count: item.statistics.favorite_count,
        comment_count: item.statistics.comment_count,
    }
}

/// Accumulates comments across pages until the cap is reached.
struct CommentCollector<'a> {
    cap: usize,
    video_channel_id: &'a str,
    provenance: &'a RunProvenance,
    comments: Vec<Comment>,
}

impl<'a> CommentCollector<'a> {
    fn new(cap: usize, video_channel_id: &'a str, provenance: &'a RunProvenance) -> Self {
        Self {
            cap,
            video_channel_id,
            provenance,
            comments: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.comments.len() >= self.cap
    }

    fn make_comment(
        &self,
        api: ApiComment,
        parent_id: Option<String>,
        reply_count: i64,
    ) -> Comment {
        let channel_id = api
            .snippet
            .author_channel_id
            .map(|c| c.value)
            .unwrap_or_else(|| self.video_channel_id.to_string());
        Comment {
            id: api.id,
            parent_id,
            channel_id,
            text: api.snippet.text_display,
            like_count: api.snippet.like_count,
            reply_count,
            tracking_id: self.provenance.tracking_id.clone(),
            run_date: self.provenance.run_date.clone(),
        }
    }

    /// Add a thread (top-level comment, then its replies). Returns true
    /// once the cap is reached.
    fn push_thread(&mut self, thread: CommentThread) -> bool {
        let top = thread.snippet.top_level_comment;
        let top_id = top.id.clone();
        let comment = self.make_comment(top, None, thread.snippet.total_reply_count);
        self.comments.push(comment);
        if self.is_full() {
            return true;
        }

        if let Some(replies) = thread.replies {
            for reply in replies.comments {
                let comment = self.make_comment(reply, Some(top_id.clone()), 0);
                self.comments.push(comment);
                if self.is_full() {
                    return true;
                }
            }
        }
        false
    }

    fn finish(mut self) -> Vec<Comment> {
        self.comments.truncate(self.cap);
        self.comments
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Reqwest-backed YouTube Data API client.
pub struct YouTubeClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    max_comments: usize,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, max_comments: usize) -> Self {
        Self {
            api_key: api_key.into(),
            http: reqwest::Client::new(),
            base_url: YOUTUBE_API_URL.to_string(),
            max_comments,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_api_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }
}

fn classify_api_error(status: u16, body: &str) -> SourceError {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => {
            let quota = envelope
                .error
                .errors
                .iter()
                .any(|e| e.reason == "quotaExceeded" || e.reason == "rateLimitExceeded");
            if quota {
                SourceError::RateLimited(envelope.error.message)
            } else {
                SourceError::Api {
                    status,
                    message: envelope.error.message,
                }
            }
        }
        Err(_) => SourceError::Api {
            status,
            message: body.chars().take(200).collect(),
        },
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn fetch_video_and_comments(
        &self,
        video_id: &str,
        provenance: &RunProvenance,
    ) -> Result<(VideoContext, Vec<Comment>), SourceError> {
        let list: VideoListResponse = self
            .get(
                "videos",
                &[("part", "snippet,contentDetails,statistics"), ("id", video_id)],
            )
            .await?;

        let item = list
            .items
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(video_id.to_string()))?;
        let video = video_from_item(item, provenance);
        info!(video_id, "fetched video details");

        let page_size = PAGE_SIZE.to_string();
        let mut collector = CommentCollector::new(self.max_comments, &video.channel_id, provenance);
        let mut page_token: Option<String> = None;

        'pages: loop {
            let mut query = vec![
                ("part", "snippet,replies"),
                ("videoId", video_id),
                ("textFormat", "plainText"),
                ("maxResults", page_size.as_str()),
                ("order", "relevance"),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: CommentThreadListResponse = match self.get("commentThreads", &query).await {
                Ok(page) => page,
                Err(SourceError::RateLimited(msg)) => {
                    warn!(
                        fetched = collector.comments.len(),
                        reason = %msg,
                        "quota exceeded while fetching comments, keeping what was fetched"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            debug!(threads = page.items.len(), "fetched comment page");

            for thread in page.items {
                if collector.push_thread(thread) {
                    info!(limit = self.max_comments, "reached comment fetch limit");
                    break 'pages;
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        let comments = collector.finish();
        info!(count = comments.len(), video_id, "fetched comments");
        Ok((video, comments))
    }
}
