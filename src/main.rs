use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use voice_recorder::bridge::Rejection;
use voice_recorder::{create_router, AppState, AudioSource, Config, Directory, RecordOptions, VoiceRecorderBridge};

/// Gap between a simulated interruption and its end
const INTERRUPTION_GAP: Duration = Duration::from_millis(250);

#[derive(Debug, Parser)]
#[command(name = "voice-recorder", version, about = "Interruption-tolerant voice recorder")]
struct Cli {
    /// Configuration file, without extension
    #[arg(long, default_value = "config/voice-recorder")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP host adapter
    Serve,

    /// Record for a fixed time and print the stop payload as JSON
    Record {
        #[arg(long, default_value_t = 3)]
        seconds: u64,

        /// Logical location (DOCUMENTS, CACHE, ...); inline base64 when omitted
        #[arg(long)]
        directory: Option<String>,

        #[arg(long)]
        sub_directory: Option<String>,

        /// Simulate an interruption this many ms in, then resume
        #[arg(long)]
        interrupt_after_ms: Option<u64>,

        #[arg(long)]
        volume_metering: bool,

        /// Replay an audio file instead of the built-in tone
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Voice Recorder v{}", env!("CARGO_PKG_VERSION"));
    info!("Response format: {:?}", cfg.response_format());

    match cli.command {
        Commands::Serve => serve(cfg).await,
        Commands::Record {
            seconds,
            directory,
            sub_directory,
            interrupt_after_ms,
            volume_metering,
            input,
        } => {
            let options = RecordOptions {
                directory: directory.as_deref().map(Directory::from_name),
                sub_directory,
                volume_metering,
            };
            let source = input
                .map(AudioSource::File)
                .unwrap_or_else(|| cfg.audio.signal_source());
            record(cfg, source, options, Duration::from_secs(seconds), interrupt_after_ms).await
        }
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let (bridge, _platform) = VoiceRecorderBridge::desktop(&cfg, cfg.audio.signal_source());
    let app = create_router(AppState::new(Arc::new(bridge)));

    let addr = format!("{}:{}", cfg.http.bind, cfg.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

async fn record(
    cfg: Config,
    source: AudioSource,
    options: RecordOptions,
    length: Duration,
    interrupt_after_ms: Option<u64>,
) -> Result<()> {
    let (bridge, platform) = VoiceRecorderBridge::desktop(&cfg, source);

    let mut events = bridge.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!("{} {:?}", event.name(), event.data());
        }
    });

    bridge.start_recording(options).await.map_err(rejected)?;

    match interrupt_after_ms {
        Some(ms) => {
            let before = Duration::from_millis(ms).min(length);
            tokio::time::sleep(before).await;

            let session = platform.session();
            session.interrupt();
            tokio::time::sleep(INTERRUPTION_GAP).await;
            session.end_interruption();
            tokio::time::sleep(INTERRUPTION_GAP).await;

            bridge.resume_recording().await.map_err(rejected)?;
            tokio::time::sleep(length - before).await;
        }
        None => tokio::time::sleep(length).await,
    }

    let payload = bridge.stop_recording().await.map_err(rejected)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn rejected(rejection: Rejection) -> anyhow::Error {
    anyhow!("{} ({})", rejection.message, rejection.code)
}
