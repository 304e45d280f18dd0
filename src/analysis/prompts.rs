//! Prompt construction for the map and reduce phases

use super::chunker::Chunk;
use super::types::AnalysisError;
use crate::video::VideoContext;
use serde::Serialize;

const MAP_INSTRUCTIONS: &str = r#"You are a YouTube marketing strategist and data analyst. Below is one video's metadata together with ONE CHUNK of its comments. Summarize this chunk only; the summaries of all chunks are combined in a later step.

Respond with a single minified JSON object and nothing else. Start with '{' and end with '}'. Escape every string value properly.

Fields:
1. "sentiment_analysis": {"positive_comments": int, "negative_comments": int, "neutral_comments": int, "summary": one sentence on this chunk's sentiment}
2. "key_themes": the 3-5 dominant themes of this chunk, each {"theme_title", "summary" (1-3 sentences), "representative_comment" (verbatim text of one comment from this chunk)}
3. "engagement_highlights": the 2 comments of this chunk with the most likes plus replies, each {"comment_text", "engagement_count" (likes + replies), "reason_for_engagement"}"#;

const REDUCE_INSTRUCTIONS: &str = r#"Respond with a single minified JSON object ready to load into a warehouse table. Start with '{' and end with '}'. Do not wrap it in markdown fences. Escape every string value: a double quote becomes \" and a backslash becomes \\.

Fields:
1. "executive_summary": 5-10 sentences on overall performance, audience reception and the most important takeaway for the creator.
2. "performance_metrics":
   - "video_statistics": {"view_count", "like_count", "comment_count"} copied from the video metadata
   - "engagement_ratios": {"like_to_view_ratio", "comment_to_view_ratio"} as decimals computed from the video metadata
   - "interpretation": 3-10 sentences interpreting these numbers
3. "audience_analysis": {"sentiment_label" (Overwhelmingly Positive | Positive | Mixed | Negative | Overwhelmingly Negative), "summary" (2-5 sentences), "positive_comments", "negative_comments", "neutral_comments" (each the SUM over all partial analyses), "audience_persona" (2-5 sentences)}
4. "content_feedback": {"positive_feedback" and "constructive_criticism" (top 5 each, items {"point", "representative_comment"}), "unanswered_questions" (top 5, items {"question", "representative_comment"})}
5. "key_themes": top 10 themes, items {"theme_title", "summary" (2-3 sentences), "representative_comment"}
6. "engagement_highlights": top 10 comments by likes plus replies, items {"comment_text", "engagement_count", "reason_for_engagement"}
7. "swot_analysis": {"strengths", "weaknesses", "opportunities", "threats"}, 3-5 sentences each
8. "actionable_recommendations": {"content_strategy" (items {"idea", "reason"}), "video_improvements" (items {"suggestion", "reason"}), "community_management" (one string), "monetization_opportunities" (items {"category", "products": [string]})}

Output only these eight fields. Do NOT include "tracking_id" or "run_date"; they are filled in programmatically."#;

/// The payload embedded in a chunk prompt: the video fields flattened next
/// to this chunk's comments.
#[derive(Serialize)]
struct ChunkPayload<'a> {
    #[serde(flatten)]
    video: &'a VideoContext,
    comments: &'a [crate::video::Comment],
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AnalysisError> {
    serde_json::to_string(value).map_err(|e| AnalysisError::Prompt(e.to_string()))
}

/// Prompt for one map-phase chunk.
pub fn chunk_prompt(video: &VideoContext, chunk: &Chunk) -> Result<String, AnalysisError> {
    let payload = to_json(&ChunkPayload {
        video,
        comments: &chunk.comments,
    })?;
    Ok(format!(
        "{MAP_INSTRUCTIONS}\n\nInput data (video metadata and comment chunk):\n{payload}\n"
    ))
}

/// Prompt for the reduction step.
///
/// Embeds only the video metadata (raw counts, no comments) and the
/// combined partial analyses array.
pub fn reduce_prompt(video: &VideoContext, partials: &str) -> Result<String, AnalysisError> {
    let metadata = to_json(video)?;
    Ok(format!(
        "You are a YouTube marketing strategist and data analyst. Combine the partial analyses of this video's comment chunks into one final report. Be professional, insightful and encouraging; the goal is to help the creator understand their audience and grow the channel.\n\n\
         Video metadata (use these overall counts for performance metrics, not sums from the chunks):\n{metadata}\n\n\
         Partial comment analyses (one JSON object per comment chunk):\n{partials}\n\n\
         {REDUCE_INSTRUCTIONS}\n"
    ))
}
