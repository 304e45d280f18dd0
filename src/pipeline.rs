//! The fetch → analyze → ingest pipeline
//!
//! Each stage is keyed by a tracking id and hands off to the next through
//! the object store. Stages return a `StageReport` naming the next stage.

use crate::analysis::{
    AnalysisConfig, AnalysisError, AnalysisOrchestrator, AnalysisRecord, CancellationToken,
};
use crate::config::ConfigError;
use crate::llm::{LlmError, TextGenerator};
use crate::storage::{analyzed_key, get_json, put_json, raw_key, ObjectStore, StorageError};
use crate::video::{
    extract_video_id, CommentRecord, RunProvenance, SourceError, VideoSnapshot, VideoSource,
};
use crate::warehouse::{Table, Warehouse, WarehouseError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, info_span, Instrument};

/// Errors from running a pipeline stage
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("model client error: {0}")]
    Llm(#[from] LlmError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Analyze,
    Ingest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Skipped,
    Error,
}

/// Outcome of one stage, printed as JSON by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub tracking_id: String,
    pub processing_time: String,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_stage: Option<Stage>,
}

impl StageReport {
    fn new(stage: Stage, tracking_id: &str, started: Instant, status: StageStatus) -> Self {
        Self {
            stage,
            tracking_id: tracking_id.to_string(),
            processing_time: format!("{:.3?}", started.elapsed()),
            status,
            message: String::new(),
            next_stage: None,
        }
    }

    /// A report for a stage that failed with `error`.
    pub fn failed(
        stage: Stage,
        tracking_id: &str,
        started: Instant,
        error: &PipelineError,
    ) -> Self {
        Self::new(stage, tracking_id, started, StageStatus::Error).with_message(error.to_string())
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_next(mut self, stage: Stage) -> Self {
        self.next_stage = Some(stage);
        self
    }
}

fn require_tracking_id(tracking_id: &str) -> Result<&str, PipelineError> {
    let trimmed = tracking_id.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::Validation("missing tracking id".into()));
    }
    Ok(trimmed)
}

/// The three stages wired to their collaborators.
///
/// The object store and warehouse are always present; the video source and
/// text generator only need to be set for the stages that use them.
pub struct Pipeline {
    store: Arc<dyn ObjectStore>,
    warehouse: Arc<dyn Warehouse>,
    source: Option<Arc<dyn VideoSource>>,
    generator: Option<Arc<dyn TextGenerator>>,
    analysis: AnalysisConfig,
}

impl Pipeline {
    pub fn new(store: Arc<dyn ObjectStore>, warehouse: Arc<dyn Warehouse>) -> Self {
        Self {
            store,
            warehouse,
            source: None,
            generator: None,
            analysis: AnalysisConfig::new(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn VideoSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_analysis_config(mut self, config: AnalysisConfig) -> Self {
        self.analysis = config;
        self
    }

    /// Fetch a video and its comments and store the raw snapshot.
    ///
    /// `video` is an id or a YouTube URL. A tracking id is generated when
    /// none is given.
    pub async fn fetch(
        &self,
        video: &str,
        tracking_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<StageReport, PipelineError> {
        let started = Instant::now();
        let video_id = extract_video_id(video)?;
        let provenance = RunProvenance::resolve(tracking_id);
        let source = self.source.as_ref().ok_or(PipelineError::NotConfigured("video source"))?;

        let span = info_span!("fetch", tracking_id = %provenance.tracking_id, video_id = %video_id);
        async {
            info!("Fetching video and comments");
            let (video, comments) = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                fetched = source.fetch_video_and_comments(&video_id, &provenance) => fetched?,
            };

            let count = comments.len();
            let snapshot = VideoSnapshot::new(video, comments);
            let key = raw_key(&provenance.tracking_id);
            put_json(self.store.as_ref(), &key, &snapshot).await?;
            info!(comments = count, location = %self.store.location(&key), "Stored raw snapshot");

            let report = StageReport::new(
                Stage::Fetch,
                &provenance.tracking_id,
                started,
                StageStatus::Success,
            );
            Ok::<_, PipelineError>(
                report
                    .with_message(format!(
                        "Fetched video {video_id} with {count} comments and stored {key}"
                    ))
                    .with_next(Stage::Analyze),
            )
        }
        .instrument(span)
        .await
    }

    /// Analyze a stored snapshot and store the finalized report.
    pub async fn analyze(
        &self,
        tracking_id: &str,
        cancel: &CancellationToken,
    ) -> Result<StageReport, PipelineError> {
        let started = Instant::now();
        let tracking_id = require_tracking_id(tracking_id)?;
        let generator = self
            .generator
            .clone()
            .ok_or(PipelineError::NotConfigured("text generator"))?;

        let span = info_span!("analyze", tracking_id = %tracking_id);
        async {
            let raw = raw_key(tracking_id);
            info!(location = %self.store.location(&raw), "Loading raw snapshot");
            let snapshot: VideoSnapshot = get_json(self.store.as_ref(), &raw).await?;

            let provenance = RunProvenance::today(tracking_id);
            let finalized = AnalysisOrchestrator::new(generator)
                .with_config(self.analysis.clone())
                .analyze(&snapshot, &provenance, cancel)
                .await?;

            let key = analyzed_key(tracking_id);
            self.store.put(&key, finalized.json.into_bytes()).await?;
            info!(location = %self.store.location(&key), "Stored final analysis");

            Ok::<_, PipelineError>(
                StageReport::new(Stage::Analyze, tracking_id, started, StageStatus::Success)
                    .with_message(format!("Analyzed video {} and stored {key}", snapshot.video.id))
                    .with_next(Stage::Ingest),
            )
        }
        .instrument(span)
        .await
    }

    /// Load stored results into the warehouse, skipping whatever is already there.
    pub async fn ingest(&self, tracking_id: &str) -> Result<StageReport, PipelineError> {
        let started = Instant::now();
        let tracking_id = require_tracking_id(tracking_id)?;

        let span = info_span!("ingest", tracking_id = %tracking_id);
        async {
            let mut messages = Vec::new();
            let mut inserted = false;

            if self.warehouse.record_exists(Table::Videos, tracking_id)? {
                info!("Raw data already in warehouse, skipping");
                messages.push(format!("Raw data for {tracking_id} already exists. Skipping."));
            } else {
                let snapshot: VideoSnapshot =
                    get_json(self.store.as_ref(), &raw_key(tracking_id)).await?;
                let video_id = snapshot.video.id.clone();
                let rows: Vec<CommentRecord> = snapshot
                    .comments
                    .into_iter()
                    .map(|c| CommentRecord::for_video(&video_id, c))
                    .collect();
                let count = self.warehouse.insert_raw(&snapshot.video, &rows)?;
                info!(video_id = %video_id, comments = count, "Ingested raw data");
                messages.push(format!("Ingested video data for video {video_id}."));
                if count > 0 {
                    messages.push(format!("Ingested {count} comments."));
                }
                inserted = true;
            }

            if self.warehouse.record_exists(Table::Analyzed, tracking_id)? {
                info!("Analysis already in warehouse, skipping");
                messages.push(format!("Analysis for {tracking_id} already exists. Skipping."));
            } else {
                let key = analyzed_key(tracking_id);
                match get_json::<AnalysisRecord>(self.store.as_ref(), &key).await {
                    Ok(record) => {
                        self.warehouse.insert_analysis(&record)?;
                        info!("Ingested analysis");
                        messages.push("Ingested analysis.".to_string());
                        inserted = true;
                    }
                    Err(StorageError::NotFound(_)) => {
                        info!(key = %key, "No analysis stored yet, skipping");
                        messages.push(format!("No analysis found at {key}. Skipping."));
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            let status = if inserted {
                StageStatus::Success
            } else {
                StageStatus::Skipped
            };
            Ok::<_, PipelineError>(
                StageReport::new(Stage::Ingest, tracking_id, started, status)
                    .with_message(messages.join(" ")),
            )
        }
        .instrument(span)
        .await
    }

    /// Run fetch, analyze and ingest for one video, stopping at the first failure.
    ///
    /// A tracking id is generated when none is given. On failure the reports
    /// of the completed stages plus a failed report for the stage that broke
    /// are returned with the error.
    pub async fn run(
        &self,
        video: &str,
        tracking_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<StageReport>, (Vec<StageReport>, PipelineError)> {
        let provenance = RunProvenance::resolve(tracking_id);
        let tid = provenance.tracking_id.as_str();
        let mut reports = Vec::with_capacity(3);

        let started = Instant::now();
        match self.fetch(video, Some(tid), cancel).await {
            Ok(report) => reports.push(report),
            Err(e) => return Err(failed_run(reports, Stage::Fetch, tid, started, e)),
        }

        let started = Instant::now();
        match self.analyze(tid, cancel).await {
            Ok(report) => reports.push(report),
            Err(e) => return Err(failed_run(reports, Stage::Analyze, tid, started, e)),
        }

        let started = Instant::now();
        match self.ingest(tid).await {
            Ok(report) => reports.push(report),
            Err(e) => return Err(failed_run(reports, Stage::Ingest, tid, started, e)),
        }

        Ok(reports)
    }
}

fn failed_run(
    mut reports: Vec<StageReport>,
    stage: Stage,
    tracking_id: &str,
    started: Instant,
    error: PipelineError,
) -> (Vec<StageReport>, PipelineError) {
    reports.push(StageReport::failed(stage, tracking_id, started, &error));
    (reports, error)
}
