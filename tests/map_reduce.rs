//! Map-reduce analysis through the public orchestrator API
//!
//! All tests run on paused tokio time so rate-limit spacing and retry
//! backoff can be asserted exactly without real waiting.

mod common;

use commentlens::llm::{CandidateError, LlmError, Purpose};
use commentlens::{
    AnalysisConfig, AnalysisError, AnalysisOrchestrator, CancellationToken, GenerateResponse,
    MockGenerator, SanitizeError,
};
use common::{provenance, snapshot, valid_report_json};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const FRAGMENTS: [&str; 3] = [
    r#"{"sentiment_analysis":{"positive_comments":80}}"#,
    r#"{"sentiment_analysis":{"positive_comments":90}}"#,
    r#"{"sentiment_analysis":{"positive_comments":30}}"#,
];

fn scripted_chunks(mock: MockGenerator) -> MockGenerator {
    FRAGMENTS
        .iter()
        .enumerate()
        .fold(mock, |mock, (i, fragment)| {
            mock.at_index(
                Purpose::ChunkAnalysis,
                i,
                Ok(GenerateResponse::text(*fragment)),
            )
        })
}

// --- Scenario: 250 comments, chunk size 100 ---

#[tokio::test(start_paused = true)]
async fn two_hundred_fifty_comments_run_end_to_end() {
    let mock = Arc::new(scripted_chunks(MockGenerator::new()).with_text(
        Purpose::Reduction,
        format!("Sure! {}", valid_report_json()),
    ));
    let orchestrator = AnalysisOrchestrator::new(mock.clone());
    let prov = provenance("tid-e2e");

    let finalized = orchestrator
        .analyze(&snapshot(250, &prov), &prov, &CancellationToken::new())
        .await
        .unwrap();

    // Three chunk calls, each carrying exactly its own comments
    let calls = mock.calls();
    let chunk_calls: Vec<_> = calls
        .iter()
        .filter(|c| c.purpose == Purpose::ChunkAnalysis)
        .collect();
    assert_eq!(chunk_calls.len(), 3);
    for call in &chunk_calls {
        let expected = if call.index == 2 { 50 } else { 100 };
        assert_eq!(call.prompt.matches(r#""text":"Comment number"#).count(), expected);
    }

    // Rate limited at least 600 ms apart
    let mut times: Vec<Instant> = chunk_calls.iter().map(|c| c.at).collect();
    times.sort();
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(600));
    }

    // The reduction embeds all fragments as one array plus the raw counts
    let reduction = calls
        .iter()
        .find(|c| c.purpose == Purpose::Reduction)
        .unwrap();
    assert!(reduction.prompt.contains(r#""view_count":1000"#));
    assert!(reduction.prompt.contains(r#""like_count":50"#));
    assert!(!reduction.prompt.contains("Comment number"));
    let array_start = reduction.prompt.find("[{\"sentiment_analysis\"").unwrap();
    let array_end = array_start + reduction.prompt[array_start..].find("}}]").unwrap() + 3;
    let array: Vec<serde_json::Value> =
        serde_json::from_str(&reduction.prompt[array_start..array_end]).unwrap();
    assert_eq!(array.len(), 3);
    for fragment in FRAGMENTS {
        assert!(reduction.prompt.contains(fragment));
    }

    // Provenance comes from the run, not the model
    assert_eq!(finalized.record.tracking_id, "tid-e2e");
    assert_eq!(finalized.record.run_date, "2026-10-16");
    let json: serde_json::Value = serde_json::from_str(&finalized.json).unwrap();
    assert_eq!(json["tracking_id"], "tid-e2e");
}

#[tokio::test(start_paused = true)]
async fn configured_chunk_size_sets_the_fan_out() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_text(Purpose::ChunkAnalysis, FRAGMENTS[0])
            .with_text(Purpose::Reduction, valid_report_json()),
    );
    let config = AnalysisConfig::default().with_chunk_size(NonZeroUsize::new(50).unwrap());
    let prov = provenance("tid-chunk-size");

    AnalysisOrchestrator::new(mock.clone())
        .with_config(config)
        .analyze(&snapshot(120, &prov), &prov, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(mock.call_count(Purpose::ChunkAnalysis), 3);
    let last_chunk = mock
        .calls()
        .into_iter()
        .find(|c| c.purpose == Purpose::ChunkAnalysis && c.index == 2)
        .unwrap();
    assert_eq!(last_chunk.prompt.matches(r#""text":"Comment number"#).count(), 20);
}

// --- Scenario: a single failed chunk fails the run ---

#[tokio::test(start_paused = true)]
async fn one_failed_chunk_fails_the_run_without_reduction() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_text(Purpose::ChunkAnalysis, FRAGMENTS[0])
            .at_index(
                Purpose::ChunkAnalysis,
                1,
                Err(LlmError::Api {
                    status: 500,
                    body: "internal".into(),
                }),
            )
            .with_text(Purpose::Reduction, valid_report_json()),
    );
    let prov = provenance("tid-fail");

    let err = AnalysisOrchestrator::new(mock.clone())
        .analyze(&snapshot(250, &prov), &prov, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::MapPhase { failed: 1, total: 3 }));
    assert_eq!(mock.call_count(Purpose::Reduction), 0);
}

// --- Scenario: malformed reductions are retried ---

#[tokio::test(start_paused = true)]
async fn two_malformed_reductions_then_success() {
    let report = valid_report_json();
    let truncated = report[..report.len() - 1].to_string();
    let mock = Arc::new(
        MockGenerator::new()
            .with_text(Purpose::ChunkAnalysis, FRAGMENTS[0])
            .then_text(Purpose::Reduction, truncated.clone())
            .then_text(Purpose::Reduction, truncated)
            .then_text(Purpose::Reduction, report),
    );
    let prov = provenance("tid-retry");

    let finalized = AnalysisOrchestrator::new(mock.clone())
        .analyze(&snapshot(10, &prov), &prov, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(finalized.record.tracking_id, "tid-retry");
    let reductions: Vec<_> = mock
        .calls()
        .into_iter()
        .filter(|c| c.purpose == Purpose::Reduction)
        .collect();
    assert_eq!(reductions.len(), 3);
    assert!(reductions[1].at - reductions[0].at >= Duration::from_secs(2));
    assert!(reductions[2].at - reductions[1].at >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn persistent_transport_failure_stops_after_three_attempts() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_text(Purpose::ChunkAnalysis, FRAGMENTS[0])
            .with_failure(Purpose::Reduction, LlmError::Request("timeout".into())),
    );
    let prov = provenance("tid-exhaust");

    let err = AnalysisOrchestrator::new(mock.clone())
        .analyze(&snapshot(10, &prov), &prov, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Exhausted { attempts: 3, .. }));
    assert_eq!(mock.call_count(Purpose::Reduction), 3);
}

#[tokio::test(start_paused = true)]
async fn reply_without_candidates_is_retried_then_exhausted() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_text(Purpose::ChunkAnalysis, FRAGMENTS[0])
            .with_response(Purpose::Reduction, GenerateResponse::empty()),
    );
    let prov = provenance("tid-empty");

    let err = AnalysisOrchestrator::new(mock.clone())
        .analyze(&snapshot(3, &prov), &prov, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        AnalysisError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(
                *last,
                AnalysisError::EmptyResponse(CandidateError::NoCandidates)
            ));
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    assert_eq!(mock.call_count(Purpose::Reduction), 3);
}

#[tokio::test(start_paused = true)]
async fn report_with_extra_field_is_never_accepted() {
    let mut report: serde_json::Value = serde_json::from_str(&valid_report_json()).unwrap();
    report["virality_score"] = serde_json::json!(11);
    let mock = Arc::new(
        MockGenerator::new()
            .with_text(Purpose::ChunkAnalysis, FRAGMENTS[0])
            .with_text(Purpose::Reduction, report.to_string()),
    );
    let prov = provenance("tid-strict");

    let err = AnalysisOrchestrator::new(mock.clone())
        .analyze(&snapshot(3, &prov), &prov, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        AnalysisError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(
                *last,
                AnalysisError::Format(SanitizeError::Decode { .. })
            ));
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
}

// --- Scenario: cancellation ---

#[tokio::test(start_paused = true)]
async fn cancelling_during_map_phase_reports_cancelled() {
    let mock = Arc::new(
        MockGenerator::new()
            .with_text(Purpose::ChunkAnalysis, FRAGMENTS[0])
            .with_text(Purpose::Reduction, valid_report_json()),
    );
    let prov = provenance("tid-cancel");
    let cancel = CancellationToken::new();

    let run = {
        let mock = mock.clone();
        let cancel = cancel.clone();
        let prov = prov.clone();
        tokio::spawn(async move {
            AnalysisOrchestrator::new(mock)
                .analyze(&snapshot(1000, &prov), &prov, &cancel)
                .await
        })
    };

    // 10 chunks need 5.4 s of limiter slots; cancel part way through
    tokio::time::sleep(Duration::from_millis(1500)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_millis(50), run)
        .await
        .expect("run should stop promptly")
        .unwrap();
    assert!(matches!(result, Err(AnalysisError::Cancelled)));
    assert!(mock.call_count(Purpose::ChunkAnalysis) < 10);
    assert_eq!(mock.call_count(Purpose::Reduction), 0);
}
