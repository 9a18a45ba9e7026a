//! learnpath - command-line access to the local learning data.
//!
//! Wires the core cache and progress store to files in the data directory
//! and to the knowledge-map HTTP service, then runs one command.

use std::io;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use learnpath_core::{
    Config, FileStorage, KnowledgeApiClient, KnowledgeCache, LearningStats, ProgressTracker,
    ProgressUpdate, Source,
};

#[derive(Parser)]
#[command(name = "learnpath", version, about = "Offline knowledge points and learning progress")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the knowledge points of a node, fetching them if not cached
    Points { module: String, node: String },
    /// Print a node's stored progress as JSON
    Progress { node: String },
    /// Mark a knowledge point as completed
    Complete {
        node: String,
        kp: String,
        /// Mark it as not completed instead
        #[arg(long)]
        undo: bool,
    },
    /// Add study minutes to a node
    Study {
        node: String,
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },
    /// Record a quiz score for a node
    Quiz { node: String, score: u32 },
    /// Show a node's learning statistics
    Stats { node: String },
    /// Show how old the knowledge point cache is
    CacheStatus,
    /// Drop all cached knowledge points
    ClearCache,
}

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing() -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

fn knowledge_cache(
    config: &Config,
    storage: Arc<FileStorage>,
) -> Result<KnowledgeCache<Arc<FileStorage>, KnowledgeApiClient>> {
    let client = KnowledgeApiClient::new(&config.api_base_url, config.request_timeout())?;
    Ok(KnowledgeCache::new(storage, client).with_ttl(config.cache_ttl()))
}

fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn print_stats(stats: &LearningStats) {
    println!("Study time:      {} min", stats.study_time);
    println!("Completed tasks: {}", stats.completed_tasks);
    println!("Quiz score:      {}", stats.quiz_score);
    println!("Progress:        {}%", stats.overall_progress);
    println!(
        "Last studied:    {}",
        stats.last_study_at.map(format_millis).unwrap_or_else(|| "never".to_string())
    );
    println!("Updated:         {}", format_millis(stats.updated_at));
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing();

    let config = Config::load()?;
    let data_dir = config.data_dir()?;
    info!(data_dir = %data_dir.display(), api = %config.api_base_url, "learnpath starting");

    let storage = Arc::new(FileStorage::new(data_dir)?);
    let tracker = ProgressTracker::new(storage.clone());

    match cli.command {
        Command::Points { module, node } => {
            let lookup = knowledge_cache(&config, storage)?
                .get_knowledge_points(&module, &node)
                .await;
            match &lookup.source {
                Source::Cache => println!("source: cache"),
                Source::Remote => println!("source: remote"),
                Source::Fallback(e) => println!("source: built-in defaults ({})", e),
            }
            for point in &lookup.points {
                let mastery = point.mastery();
                println!(
                    "{:<20} {:<28} {:<7} {:?} ({})",
                    point.id,
                    point.name,
                    point.level.as_str(),
                    mastery,
                    mastery.color()
                );
            }
        }
        Command::Progress { node } => {
            let progress = tracker.get_node_progress(&node);
            println!("{}", serde_json::to_string_pretty(&progress)?);
        }
        Command::Complete { node, kp, undo } => {
            let progress = tracker.update_knowledge_status(&node, &kp, !undo)?;
            println!(
                "{}: {}/{} knowledge points, {}%",
                node,
                progress.completed_count(),
                progress.knowledge_points.len(),
                progress.overall_progress
            );
        }
        Command::Study { node, minutes } => {
            let progress = tracker.record_study_time(&node, minutes)?;
            println!("{}: {} min studied in total", node, progress.study_time);
        }
        Command::Quiz { node, score } => {
            let progress = tracker.save_node_progress(
                &node,
                ProgressUpdate {
                    quiz_score: Some(score),
                    ..Default::default()
                },
            )?;
            println!("{}: quiz score {}", node, progress.quiz_score);
        }
        Command::Stats { node } => {
            print_stats(&tracker.get_learning_stats(&node));
        }
        Command::CacheStatus => {
            match knowledge_cache(&config, storage)?.cache_age() {
                Some(age) => println!("knowledge points cached {}", age),
                None => println!("no fresh knowledge point cache"),
            }
        }
        Command::ClearCache => {
            knowledge_cache(&config, storage)?.invalidate()?;
            println!("knowledge point cache cleared");
        }
    }

    Ok(())
}
