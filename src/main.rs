//! # Chime — time-slot notification pipeline CLI
//!
//! Usage:
//!   chime schedule --file request.json   # place/relocate/cancel a notification
//!   chime drain                          # run one drain cycle (cron entry point)
//!   chime process --file request.json    # dispatch one fanned-out notification
//!   chime run                            # in-process drain + dispatch pipeline

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chime_channels::SenderRegistry;
use chime_core::{ChimeConfig, NotificationRequest};
use chime_processor::{ContentClient, Processor, RateLimiter};
use chime_scheduler::{
    AdaptiveTimingClient, FanOut, HttpFanOut, MemoryFanOut, NullFanOut, ScheduleOutcome, Scheduler,
    Submitter,
};
use chime_store::{DeliveryLogStore, FsObjectStore, QuotaStore, SlotStore};

#[derive(Parser)]
#[command(
    name = "chime",
    version,
    about = "⏰ Chime — time-slot notification scheduler & dispatcher"
)]
struct Cli {
    /// Config file path (default ~/.chime/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Object-store root override
    #[arg(long)]
    data_dir: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Schedule, relocate, or cancel one notification from a JSON payload
    Schedule {
        /// Payload path, or '-' for stdin
        #[arg(short, long)]
        file: String,
    },
    /// Run one drain cycle
    Drain {
        /// Event time (ISO-8601); defaults to the system clock
        #[arg(long)]
        time: Option<String>,
    },
    /// Dispatch one fanned-out notification from a JSON payload
    Process {
        /// Payload path, or '-' for stdin
        #[arg(short, long)]
        file: String,
    },
    /// In-process pipeline: periodic drain feeding the dispatcher
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => ChimeConfig::load_from(Path::new(path))?,
        None => ChimeConfig::load()?,
    };

    let store_root = match &cli.data_dir {
        Some(dir) => PathBuf::from(shellexpand::tilde(dir).to_string()),
        None => config.store_root(),
    };
    std::fs::create_dir_all(&store_root)
        .with_context(|| format!("creating store root {}", store_root.display()))?;
    let object: Arc<FsObjectStore> = Arc::new(FsObjectStore::new(&store_root));
    let slots = SlotStore::new(object.clone());

    match cli.command {
        Command::Schedule { file } => {
            let request = read_request(&file)?;
            let scheduler = Scheduler::new(
                slots,
                configured_fanout(&config)?,
                AdaptiveTimingClient::new(&config.callbacks),
            );
            let outcome = scheduler.schedule(&correlation_id(), &request).await?;
            match outcome {
                ScheduleOutcome::Placed { slot } => {
                    println!("📌 Scheduled '{}' in slot {slot}", request.uid());
                }
                ScheduleOutcome::Published => {
                    println!("⚡ Published '{}' for immediate dispatch", request.uid());
                }
                ScheduleOutcome::Cancelled { removed } => {
                    println!("🗑️ Cancelled '{}' ({removed} copies removed)", request.uid());
                }
            }
        }

        Command::Drain { time } => {
            let now = match time {
                Some(t) => DateTime::parse_from_rfc3339(&t)
                    .with_context(|| format!("invalid --time '{t}'"))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let submitter = Submitter::new(slots, configured_fanout(&config)?);
            let outcome = submitter.drain(&correlation_id(), now).await?;
            println!(
                "⏱️ Drain complete: {} submitted, {} deleted, {} skipped",
                outcome.submitted, outcome.deleted, outcome.skipped
            );
        }

        Command::Process { file } => {
            let request = read_request(&file)?;
            let processor = build_processor(&config, object);
            let outcome = processor.process(&correlation_id(), &request).await?;
            println!("📣 Processed '{}': {outcome:?}", request.uid());
        }

        Command::Run => {
            let (fanout, mut rx) = MemoryFanOut::channel();
            let fanout: Arc<dyn FanOut> = Arc::new(fanout);
            let submitter = Submitter::new(slots, fanout);
            let processor = build_processor(&config, object);

            println!(
                "⏰ Chime pipeline started (drain every {}s, store at {})",
                config.drain.interval_secs,
                store_root.display()
            );

            let interval_secs = config.drain.interval_secs;
            tokio::spawn(async move {
                let mut interval =
                    tokio::time::interval(std::time::Duration::from_secs(interval_secs));
                loop {
                    interval.tick().await;
                    if let Err(e) = submitter.drain(&correlation_id(), Utc::now()).await {
                        tracing::error!("drain cycle failed: {e}");
                    }
                }
            });

            while let Some(request) = rx.recv().await {
                if let Err(e) = processor.process(&correlation_id(), &request).await {
                    tracing::error!("dispatch of '{}' failed: {e}", request.uid());
                }
            }
        }
    }

    Ok(())
}

/// One correlation id per handled unit of work, carried through every span.
fn correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn read_request(path: &str) -> Result<NotificationRequest> {
    let json = if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?
    };
    serde_json::from_str(&json).context("parsing notification request")
}

fn configured_fanout(config: &ChimeConfig) -> Result<Arc<dyn FanOut>> {
    Ok(match &config.fanout.topic_url {
        Some(_) => Arc::new(HttpFanOut::new(&config.fanout)?),
        None => Arc::new(NullFanOut),
    })
}

fn build_processor(config: &ChimeConfig, object: Arc<FsObjectStore>) -> Processor {
    Processor::new(
        RateLimiter::new(QuotaStore::new(object.clone()), &config.limits),
        DeliveryLogStore::new(object),
        SenderRegistry::from_config(&config.channel),
        ContentClient::new(&config.callbacks),
    )
}
