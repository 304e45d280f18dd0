//! The final analysis report
//!
//! Decoding is strict: every section must be present and unknown fields are
//! rejected at every level, so the warehouse schema cannot drift with the
//! model's output.

use serde::{Deserialize, Serialize};

/// One video's analysis, as stored under `<tracking_id>_analyzed.json`.
///
/// `tracking_id` and `run_date` are accepted when absent and always
/// overwritten by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisRecord {
    #[serde(default)]
    pub tracking_id: String,
    #[serde(default)]
    pub run_date: String,
    pub executive_summary: String,
    pub performance_metrics: PerformanceMetrics,
    pub audience_analysis: AudienceAnalysis,
    pub content_feedback: ContentFeedback,
    pub key_themes: Vec<KeyTheme>,
    pub engagement_highlights: Vec<EngagementHighlight>,
    pub swot_analysis: SwotAnalysis,
    pub actionable_recommendations: ActionableRecommendations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerformanceMetrics {
    pub video_statistics: VideoStatistics,
    pub engagement_ratios: EngagementRatios,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoStatistics {
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngagementRatios {
    pub like_to_view_ratio: f64,
    pub comment_to_view_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudienceAnalysis {
    pub sentiment_label: String,
    pub summary: String,
    pub positive_comments: i64,
    pub negative_comments: i64,
    pub neutral_comments: i64,
    pub audience_persona: String,
}

/// Lists may be empty or omitted when the comments offer nothing to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentFeedback {
    #[serde(default)]
    pub positive_feedback: Vec<FeedbackPoint>,
    #[serde(default)]
    pub constructive_criticism: Vec<FeedbackPoint>,
    #[serde(default)]
    pub unanswered_questions: Vec<QuestionPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedbackPoint {
    pub point: String,
    pub representative_comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionPoint {
    pub question: String,
    pub representative_comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyTheme {
    pub theme_title: String,
    pub summary: String,
    pub representative_comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngagementHighlight {
    pub comment_text: String,
    pub engagement_count: i64,
    pub reason_for_engagement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwotAnalysis {
    pub strengths: String,
    pub weaknesses: String,
    pub opportunities: String,
    pub threats: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionableRecommendations {
    #[serde(default)]
    pub content_strategy: Vec<ContentIdea>,
    #[serde(default)]
    pub video_improvements: Vec<VideoImprovement>,
    pub community_management: String,
    #[serde(default)]
    pub monetization_opportunities: Vec<MonetizationOpportunity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentIdea {
    pub idea: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoImprovement {
    pub suggestion: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonetizationOpportunity {
    pub category: String,
    #[serde(default)]
    pub products: Vec<String>,
}
