//! Firewatch CLI
//!
//! One-shot fire-risk check over the latest sensor readings. Schedule it with
//! cron or a systemd timer.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use firewatch_agent::{
    core::format_local_datetime, BlockingFirebaseStore, BlockingTelegramNotifier, Clock, Config,
    ConsoleNotifier, FixedClock, MemoryStore, Notifier, Orchestrator, ReadingStore, RunMode,
    SystemClock, VERSION,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "firewatch")]
#[command(version = VERSION)]
#[command(about = "Windowed fire-risk monitor for remote environmental sensors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse the latest window of every device and send alerts
    Run {
        /// Print notifications instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Anchor the window at this epoch second instead of now
        #[arg(long)]
        at: Option<i64>,

        /// Verification run: also report devices whose status is normal
        #[arg(long)]
        verification: bool,
    },

    /// Analyse an exported database snapshot offline
    Replay {
        /// JSON export of the reading store
        #[arg(long, short)]
        file: PathBuf,

        /// Anchor the window at this epoch second (default: newest reading)
        #[arg(long)]
        at: Option<i64>,
    },

    /// Check connectivity to the store and the notification sink
    Check,

    /// Show configuration
    Config {
        /// Write the config file, filling in defaults for missing fields
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firewatch=info,firewatch_agent=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            dry_run,
            at,
            verification,
        } => cmd_run(dry_run, at, verification),
        Commands::Replay { file, at } => cmd_replay(file, at),
        Commands::Check => cmd_check(),
        Commands::Config { init } => cmd_config(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_run(dry_run: bool, at: Option<i64>, verification: bool) -> anyhow::Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if verification {
        config.mode = RunMode::Verification;
    }
    if let Some(ts) = at {
        config.reference_timestamp = Some(ts);
    }

    let settings = config.settings()?;
    let reference = match at {
        Some(ts) => Some(ts),
        None => config.fixed_reference()?,
    };
    let clock: Box<dyn Clock> = match reference {
        Some(ts) => {
            println!(
                "Using fixed reference instant {ts} ({})",
                format_local_datetime(ts, settings.timezone)
            );
            Box::new(FixedClock::new(ts))
        }
        None => Box::new(SystemClock),
    };

    let store = BlockingFirebaseStore::new(config.firebase())?;
    let notifier: Box<dyn Notifier> = if dry_run {
        println!("Dry run: notifications are printed, not sent");
        Box::new(ConsoleNotifier)
    } else {
        Box::new(BlockingTelegramNotifier::new(config.telegram())?)
    };

    let report = Orchestrator::new(store, notifier, clock, settings).run()?;

    println!();
    println!("{}", report.summary());
    Ok(())
}

fn cmd_replay(file: PathBuf, at: Option<i64>) -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let settings = config.settings()?;

    let store = MemoryStore::load_export(&file, &config.store.root)?;
    println!(
        "Loaded {} device(s) from {:?}",
        store.device_count(),
        file
    );

    let reference = at
        .or_else(|| store.latest_timestamp())
        .ok_or_else(|| anyhow!("Export contains no timestamped readings; pass --at"))?;
    println!(
        "Reference instant: {reference} ({})",
        format_local_datetime(reference, settings.timezone)
    );

    let report =
        Orchestrator::new(store, ConsoleNotifier, FixedClock::new(reference), settings).run()?;

    println!();
    println!("{}", report.summary());
    Ok(())
}

fn cmd_check() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let mut healthy = true;

    println!("Firewatch Agent v{VERSION}");
    println!();

    match BlockingFirebaseStore::new(config.firebase()).and_then(|s| s.device_ids()) {
        Ok(devices) => println!("Store: OK ({} device(s))", devices.len()),
        Err(e) => {
            healthy = false;
            println!("Store: FAILED ({e})");
        }
    }

    match BlockingTelegramNotifier::new(config.telegram()).and_then(|n| n.test_connection()) {
        Ok(true) => println!("Telegram: OK"),
        Ok(false) => {
            healthy = false;
            println!("Telegram: FAILED (bot token rejected)");
        }
        Err(e) => {
            healthy = false;
            println!("Telegram: FAILED ({e})");
        }
    }

    if healthy {
        Ok(())
    } else {
        Err(anyhow!("One or more checks failed"))
    }
}

fn cmd_config(init: bool) -> anyhow::Result<()> {
    if init {
        // Environment overrides are left out so secrets from `.env` stay there.
        let path = Config::config_path();
        let file_config = Config::load_from(&path).context("Failed to load configuration")?;
        file_config.save().context("Failed to save configuration")?;
        println!("Wrote configuration to {path:?}");
        println!();
    }

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
