use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

mod cache;
mod config;
mod engine;
mod error;
mod leader;
mod models;
mod normalize;
mod period;
mod report;
mod scoring;
mod source;
mod telemetry;
mod trend;

use config::LeaderboardConfig;
use engine::{LeaderboardEngine, LeaderboardRead};

#[derive(Parser)]
#[command(name = "team-leaderboard")]
#[command(about = "Monthly team leaderboard built from a task-tracking spreadsheet", long_about = None)]
struct Cli {
    /// Sheet export to read (a directory of CSV files or a JSON batch export);
    /// defaults to LEADERBOARD_SOURCE
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current standings
    Show {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print the JSON payload served to dashboards
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "leaderboard.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Refresh on a timer and announce leader changes
    Watch {
        #[arg(long, default_value_t = 300)]
        every_secs: u64,
        /// Stop after this many refreshes
        #[arg(long)]
        cycles: Option<u32>,
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
}

fn print_standings(read: &LeaderboardRead, limit: usize) {
    let board = &read.payload;
    if board.performers.is_empty() {
        println!("No tasks logged for {} yet.", board.stats.month_name);
        return;
    }

    println!(
        "{}: {} of {} tasks completed ({}%), velocity {} ({:+}%), quality {:.1}",
        board.stats.month_name,
        board.stats.completed,
        board.stats.total_tasks,
        board.stats.completion_percentage,
        board.trend.velocity_label,
        board.trend.velocity_change_percent,
        board.trend.quality_score
    );
    for (index, performer) in board.performers.iter().take(limit).enumerate() {
        println!("{}", report::format_standing(index + 1, performer));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = LeaderboardConfig::from_env().context("invalid leaderboard configuration")?;
    telemetry::init_tracing(&config.log_level);

    let source_path = config
        .source_path(cli.source)
        .context("no sheet source configured; pass --source or set LEADERBOARD_SOURCE")?;
    let engine = LeaderboardEngine::new(source::open_source(&source_path), config.engine_settings());
    debug!(
        source = %source_path.display(),
        sheets = ?engine.settings().sheet_names,
        cache_ttl = ?engine.settings().cache_ttl,
        "leaderboard engine ready"
    );

    match cli.command {
        Commands::Show { limit, json } => {
            let read = engine
                .get_leaderboard(Local::now().naive_local())
                .await
                .with_context(|| format!("failed to load {}", source_path.display()))?;
            debug!(freshness = ?read.freshness, "leaderboard loaded");

            if json {
                println!("{}", serde_json::to_string_pretty(&read.to_response())?);
            } else {
                print_standings(&read, limit);
            }
        }
        Commands::Report { out, limit } => {
            let now = Local::now().naive_local();
            let read = engine
                .get_leaderboard(now)
                .await
                .with_context(|| format!("failed to load {}", source_path.display()))?;
            let report = report::build_report(&read.payload, now, limit);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Watch {
            every_secs,
            cycles,
            limit,
        } => {
            let mut ticker = tokio::time::interval(Duration::from_secs(every_secs.max(1)));
            let mut completed = 0u32;

            while cycles.map_or(true, |max| completed < max) {
                ticker.tick().await;
                completed += 1;

                match engine.refresh(Local::now().naive_local()).await {
                    Ok(read) => {
                        if let Some(change) = &read.leader_change {
                            println!(
                                "New leader: {} has overtaken {}.",
                                change.current, change.previous
                            );
                        }
                        print_standings(&read, limit);
                    }
                    Err(err) => warn!(
                        error = %err,
                        last_success = ?engine.last_computed_at(),
                        leader = ?engine.current_leader(),
                        "scheduled refresh failed"
                    ),
                }
            }
        }
    }

    Ok(())
}
