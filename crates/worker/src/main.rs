//! Command-line poller for one project stage.
//!
//! `poll` runs the scheduler until the stage settles, the budget runs out,
//! or Ctrl-C is pressed. `refresh` runs a single reconciliation pass.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use reelforge_core::stage::GenerationStage;
use reelforge_core::types::DbId;
use reelforge_db::PgJobStore;
use reelforge_pipeline::{BatchReconciler, PollConfig, PollScheduler, RefreshService, StopReason};
use reelforge_provider::config::ProviderConfig;
use reelforge_provider::{HttpProvider, StatusProber};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reelforge-worker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll a stage until every job is terminal or the budget runs out
    Poll {
        /// Project ID
        #[arg(short, long)]
        project: DbId,

        /// Generation stage (`keyframe` or `clip`)
        #[arg(short, long)]
        stage: GenerationStage,

        /// Delay between passes in milliseconds (defaults to POLL_INTERVAL_MS or 10000)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Wall-clock budget in milliseconds (defaults to POLL_MAX_WAIT_MS or 1800000)
        #[arg(long)]
        max_wait_ms: Option<u64>,
    },

    /// Run one refresh pass and print the result
    Refresh {
        /// Project ID
        #[arg(short, long)]
        project: DbId,

        /// Generation stage (`keyframe` or `clip`)
        #[arg(short, long)]
        stage: GenerationStage,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelforge_worker=info,reelforge_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let database_url = cli.database_url.context("DATABASE_URL must be set")?;
    let pool = reelforge_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    let store = Arc::new(PgJobStore::new(pool));

    let provider = Arc::new(
        HttpProvider::new(ProviderConfig::from_env()).context("Failed to build provider client")?,
    );
    let refresh = Arc::new(RefreshService::new(
        store,
        BatchReconciler::new(StatusProber::new(provider)),
    ));

    match cli.command {
        Commands::Poll {
            project,
            stage,
            interval_ms,
            max_wait_ms,
        } => {
            let mut config = PollConfig::from_env();
            if let Some(ms) = interval_ms {
                config.interval = Duration::from_millis(ms);
            }
            if let Some(ms) = max_wait_ms {
                config.max_wait = Duration::from_millis(ms);
            }
            poll(PollScheduler::new(refresh, config), project, stage).await
        }
        Commands::Refresh { project, stage } => {
            let report = PollScheduler::new(refresh, PollConfig::from_env())
                .poll_once(project, stage)
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn poll(scheduler: PollScheduler, project_id: DbId, stage: GenerationStage) -> anyhow::Result<()> {
    let handle = scheduler.schedule(project_id, stage, move |progress| {
        tracing::info!(
            project_id,
            %stage,
            completed = progress.completed,
            failed = progress.failed,
            total = progress.total,
            all_done = progress.all_done,
            "Progress",
        );
    });

    let cancel = handle.cancellation_token();
    let on_signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received SIGINT (Ctrl-C), cancelling poll after the current pass");
            cancel.cancel();
        }
    });

    let outcome = handle.join().await.context("Poll task failed")?;
    on_signal.abort();
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    match outcome.stop_reason {
        StopReason::AllDone | StopReason::Cancelled => Ok(()),
        StopReason::BudgetExhausted => {
            anyhow::bail!("Gave up after {} passes with jobs still pending", outcome.passes)
        }
    }
}
