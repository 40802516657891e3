//! DriveSense command-line interface
//!
//! ```text
//! drivesense replay drive.jsonl --emit-actions
//! drivesense simulate --seconds 120 --seed 7
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drive_session::MonitoringSession;
use drivesense::{init_logging, log_dispatchers, replay, run_simulation, Settings};
use intervention::{ActionRecorder, MessagePicker};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "drivesense")]
#[command(about = "Driver fatigue and distraction monitor")]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON-lines recording
    Replay {
        /// Recording to replay
        input: PathBuf,

        /// Print every action as a JSON line instead of logging it
        #[arg(long)]
        emit_actions: bool,

        /// Seed for message selection
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Drive with a scripted driver and simulated motion
    Simulate {
        /// Length of the drive in seconds
        #[arg(short, long, default_value = "60")]
        seconds: u64,

        /// Seed for message selection and motion
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    init_logging(cli.verbose, cli.json_logs || settings.logging.json);

    match cli.command {
        Command::Replay {
            input,
            emit_actions,
            seed,
        } => {
            let seed = seed.or(settings.message_seed);
            let picker = seed.map(MessagePicker::seeded).unwrap_or_default();
            let mut session = MonitoringSession::with_parts(
                settings.monitor.clone(),
                settings.kinematics.clone(),
                picker,
            )?;

            let file = File::open(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            info!("Replaying {}", input.display());

            let report = if emit_actions {
                let recorder = ActionRecorder::new();
                let mut dispatchers = recorder.dispatchers();
                let report = replay(BufReader::new(file), &mut session, &mut dispatchers)?;
                for action in recorder.take() {
                    println!("{}", serde_json::to_string(&action)?);
                }
                report
            } else {
                let mut dispatchers = log_dispatchers();
                replay(BufReader::new(file), &mut session, &mut dispatchers)?
            };

            println!("{}", report.summary);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Simulate { seconds, seed } => {
            if seed.is_some() {
                settings.message_seed = seed;
                settings.simulator.seed = seed;
            }

            let summary = run_simulation(&settings, seconds, log_dispatchers()).await?;
            println!("{}", summary);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
