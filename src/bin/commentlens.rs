//! commentlens CLI: fetch, analyze and ingest YouTube comment analyses.
//!
//! Usage:
//!   commentlens [--config file.yaml] [--log-format text|json] fetch <video> [--tracking-id id]
//!   commentlens analyze <tracking-id>
//!   commentlens ingest <tracking-id>
//!   commentlens run <video> [--tracking-id id]
//!
//! Each command prints its stage report(s) as JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand, ValueEnum};
use commentlens::{
    AppConfig, CancellationToken, FsObjectStore, GeminiClient, OpenWarehouse, Pipeline,
    PipelineError, RunProvenance, SqliteWarehouse, Stage, StageReport, YouTubeClient,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "commentlens",
    version,
    about = "Map-reduce LLM analysis of YouTube comments"
)]
struct Cli {
    /// YAML file overriding environment configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a video and its comments and store the raw snapshot
    Fetch {
        /// Video id or YouTube URL
        video: String,
        /// Tracking id to use (generated when omitted)
        #[arg(long)]
        tracking_id: Option<String>,
    },
    /// Analyze a stored snapshot
    Analyze {
        tracking_id: String,
    },
    /// Load stored results into the warehouse
    Ingest {
        tracking_id: String,
    },
    /// Fetch, analyze and ingest one video
    Run {
        /// Video id or YouTube URL
        video: String,
        /// Tracking id to use (generated when omitted)
        #[arg(long)]
        tracking_id: Option<String>,
    },
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("commentlens=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: could not encode report: {}", e),
    }
}

fn build_pipeline(config: &AppConfig, command: &Commands) -> Result<Pipeline, PipelineError> {
    let store = Arc::new(FsObjectStore::new(config.bucket_dir()));
    let warehouse = Arc::new(SqliteWarehouse::open(&config.warehouse_db)?);
    let mut pipeline = Pipeline::new(store, warehouse);

    let needs_source = matches!(command, Commands::Fetch { .. } | Commands::Run { .. });
    let needs_generator = matches!(command, Commands::Analyze { .. } | Commands::Run { .. });

    if needs_source {
        let youtube =
            YouTubeClient::new(config.require_youtube_key()?, config.max_comments_to_fetch);
        pipeline = pipeline.with_source(Arc::new(youtube));
    }
    if needs_generator {
        let gemini = GeminiClient::new(config.require_gemini_key()?, config.gemini_model.as_str())?;
        pipeline = pipeline.with_generator(Arc::new(gemini));
    }
    Ok(pipeline)
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            token.cancel();
        }
    });
}

fn report_single(
    stage: Stage,
    tracking_id: &str,
    started: Instant,
    result: Result<StageReport, PipelineError>,
) -> i32 {
    match result {
        Ok(report) => {
            print_json(&report);
            0
        }
        Err(e) => {
            print_json(&StageReport::failed(stage, tracking_id, started, &e));
            1
        }
    }
}

async fn run_command(pipeline: Pipeline, command: Commands, cancel: CancellationToken) -> i32 {
    let started = Instant::now();
    match command {
        Commands::Fetch { video, tracking_id } => {
            let tracking_id = RunProvenance::resolve(tracking_id.as_deref()).tracking_id;
            let result = pipeline.fetch(&video, Some(&tracking_id), &cancel).await;
            report_single(Stage::Fetch, &tracking_id, started, result)
        }
        Commands::Analyze { tracking_id } => {
            let result = pipeline.analyze(&tracking_id, &cancel).await;
            report_single(Stage::Analyze, &tracking_id, started, result)
        }
        Commands::Ingest { tracking_id } => {
            let result = pipeline.ingest(&tracking_id).await;
            report_single(Stage::Ingest, &tracking_id, started, result)
        }
        Commands::Run { video, tracking_id } => {
            match pipeline.run(&video, tracking_id.as_deref(), &cancel).await {
                Ok(reports) => {
                    info!(stages = reports.len(), "Run complete");
                    print_json(&reports);
                    0
                }
                Err((reports, e)) => {
                    error!(error = %e, "Run failed");
                    print_json(&reports);
                    1
                }
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    info!(version = commentlens::VERSION, "commentlens starting");

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline = match build_pipeline(&config, &cli.command) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = rt.block_on(async {
        let cancel = CancellationToken::new();
        cancel_on_interrupt(cancel.clone());
        run_command(pipeline, cli.command, cancel).await
    });
    std::process::exit(code);
}
