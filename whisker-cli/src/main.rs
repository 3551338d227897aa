// whisker command line entry point
// Wires camera, detector, actuators and preview into the detection loop

mod wiring;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use whisker_core::WhiskerConfig;
use whisker_eye::detector::names_by_id;
use whisker_wld::{DetectionLoopRunner, StopHandle, StopReason};

use crate::wiring::SourceArg;

#[derive(Parser)]
#[command(name = "whisker")]
#[command(about = "Camera object detection driving a buzzer and an RGB indicator", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); WHISKER__* environment variables override it
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Run without the preview window
    #[arg(long)]
    no_preview: bool,

    /// Frame source: `camera`, or a directory of images to replay
    #[arg(long, default_value = "camera", value_parser = wiring::parse_source)]
    source: SourceArg,

    /// Start the replay directory over instead of stopping at its end
    #[arg(long)]
    loop_replay: bool,

    /// Use in-memory actuators instead of GPIO
    #[arg(long)]
    simulate_actuators: bool,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Model name, overriding the configuration
    #[arg(long)]
    model: Option<String>,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<WhiskerConfig> {
    let mut config = WhiskerConfig::load(cli.config.as_deref())?;
    if cli.no_preview {
        config.show_preview = false;
    }
    if let Some(model) = &cli.model {
        config.model.name = model.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

fn exit_status(reason: StopReason) -> u8 {
    match reason {
        StopReason::UserRequested => 0,
        StopReason::CaptureFailed => 2,
        StopReason::InferenceFailed => 3,
        StopReason::StartFailed => 4,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = load_config(&cli)?;
    info!(
        "Starting whisker with {} detection classes (preview {})",
        config.detection_classes.len(),
        if config.show_preview { "on" } else { "off" }
    );

    let detector = wiring::build_detector(&config).await?;
    let names = names_by_id(detector.labels());
    let colors = wiring::class_colors(&config, detector.labels());
    let source = wiring::build_source(&cli.source, cli.loop_replay, &config)?;
    let actuators = wiring::build_actuators(&config, cli.simulate_actuators)?;

    let stop = StopHandle::new();
    let mut runner = DetectionLoopRunner::from_config(&config, source, detector, actuators)?
        .with_stop_handle(stop.clone());
    if config.show_preview {
        if let Some(preview) = wiring::build_preview(names, colors) {
            runner = runner.with_preview(preview);
        }
    }

    tokio::spawn(async move {
        wait_for_shutdown().await;
        stop.request_stop();
    });

    let reason = tokio::task::spawn_blocking(move || runner.run()).await??;
    if reason.is_clean() {
        info!("whisker stopped");
    } else {
        error!("whisker stopped: {:?}", reason);
    }
    Ok(ExitCode::from(exit_status(reason)))
}
