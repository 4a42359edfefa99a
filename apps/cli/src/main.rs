//! signspeak - headless yes/no sign conversation.
//!
//! Replays camera stills from a directory, sends one to the sign classifier
//! every detection cycle and prints the conversation as it advances. Commands
//! are read from stdin, one per line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use signspeak_classify::{ClassifierConfig, HttpClassifier, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS};
use signspeak_conversation::{
    ConversationHandle, ConversationRuntime, ConversationSnapshot, Questions, SchedulerConfig,
};
use signspeak_events::{BroadcastEventBus, EmittedEvent};
use signspeak_media::{DirectoryCamera, JpegConfig, MediaSource, DEFAULT_JPEG_QUALITY};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, watch};
use tracing_subscriber::EnvFilter;

mod command;
mod render;

use command::Command;

/// Command-line arguments for signspeak
#[derive(Parser, Debug)]
#[command(name = "signspeak")]
#[command(about = "Yes/no question conversation answered in sign language")]
#[command(version)]
struct Args {
    /// Sign classification endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT, env = "SIGNSPEAK_ENDPOINT")]
    endpoint: String,

    /// Directory of camera stills (jpg/png) replayed as the video feed
    #[arg(long, env = "SIGNSPEAK_FRAMES_DIR")]
    frames_dir: PathBuf,

    /// Question list, one per line (defaults to the restaurant set)
    #[arg(long, env = "SIGNSPEAK_QUESTIONS")]
    questions: Option<PathBuf>,

    /// Wait before each capture
    #[arg(long, default_value_t = 5000, env = "SIGNSPEAK_CYCLE_DELAY_MS")]
    cycle_delay_ms: u64,

    /// How long a YES/NO stays on screen before the next question
    #[arg(long, default_value_t = 1000, env = "SIGNSPEAK_SETTLE_DELAY_MS")]
    settle_delay_ms: u64,

    /// JPEG quality of uploaded frames (1-100)
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "SIGNSPEAK_JPEG_QUALITY")]
    jpeg_quality: u8,

    /// Classifier request timeout
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS, env = "SIGNSPEAK_TIMEOUT_MS")]
    timeout_ms: u64,

    /// Start the conversation without waiting for a 'start' command
    #[arg(long)]
    auto_start: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,signspeak=debug,signspeak_conversation=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::info!(endpoint = %args.endpoint, frames = %args.frames_dir.display(), "starting signspeak");

    let questions = match &args.questions {
        Some(path) => Questions::from_file(path)
            .with_context(|| format!("Failed to load questions from {}", path.display()))?,
        None => Questions::restaurant(),
    };

    let camera = DirectoryCamera::open(&args.frames_dir)
        .with_context(|| format!("Failed to open frames directory {}", args.frames_dir.display()))?;
    tracing::info!(frames = camera.frame_count(), "replay camera ready");

    let media = MediaSource::with_jpeg_config(
        Arc::new(camera),
        JpegConfig {
            quality: args.jpeg_quality,
        },
    );

    let classifier = HttpClassifier::new(ClassifierConfig {
        endpoint: args.endpoint.clone(),
        timeout_ms: args.timeout_ms,
        ..Default::default()
    })
    .context("Failed to build classifier client")?;

    let bus = Arc::new(BroadcastEventBus::default());
    tokio::spawn(log_events(bus.subscribe()));

    let config = SchedulerConfig {
        cycle_delay_ms: args.cycle_delay_ms,
        settle_delay_ms: args.settle_delay_ms,
    };
    let (handle, task) =
        ConversationRuntime::new(questions, media, Arc::new(classifier), config, bus).spawn();
    tokio::spawn(print_transcript(handle.subscribe()));

    println!("Commands: start, reset, status, quit");
    if args.auto_start {
        start(&handle).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Start) => start(&handle).await,
            Ok(Command::Reset) => handle.reset().await.context("Conversation runtime stopped")?,
            Ok(Command::Status) => {
                for line in render::status_lines(&handle.snapshot()) {
                    println!("{line}");
                }
            }
            Ok(Command::Quit) => break,
            Err(e) => eprintln!("{e}"),
        }
    }

    handle.shutdown();
    task.await.context("Conversation runtime panicked")?;
    tracing::info!("signspeak stopped");
    Ok(())
}

async fn start(handle: &ConversationHandle) {
    if let Err(e) = handle.start().await {
        eprintln!("Cannot start: {e}");
    }
}

async fn print_transcript(mut rx: watch::Receiver<ConversationSnapshot>) {
    let mut prev = rx.borrow_and_update().clone();
    while rx.changed().await.is_ok() {
        let next = rx.borrow_and_update().clone();
        for line in render::transition_lines(&prev, &next) {
            println!("{line}");
        }
        prev = next;
    }
}

async fn log_events(mut rx: broadcast::Receiver<EmittedEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => tracing::debug!(topic = %event.topic, payload = %event.payload, "event"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log lagging")
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
