//! # RDS Encoder Relay
//!
//! Reads now-playing track events and pushes them to the SmartGen Mini:
//! ```text
//! track source → TrackPipeline → DeviceLink → SmartGen Mini (TEXT=, RT+TAG=)
//! ```
//!
//! Configuration problems stop the process with exit code 1 before anything
//! connects. Once running, encoder outages are ridden out by the link's
//! reconnect loop; the process only exits when the source closes or on
//! Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use rds_config::{defaults, EncoderConfig};
use rds_encoder_service::{
    run_consumer, ProfanityFilter, Sanitizer, SourceEndpoint, TrackPipeline,
};
use rds_network::DeviceLink;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rds_encoder", version, about = "Relay now-playing metadata to an RDS encoder")]
struct Args {
    /// Config file (default: config/encoder.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Track source: stdin, unix:///path or tcp://host:port
    #[arg(long)]
    source: Option<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(args: &Args) -> Result<EncoderConfig> {
    let mut overrides = Vec::new();
    if let Some(source) = &args.source {
        overrides.push(("queue.source", source.as_str()));
    }
    if let Some(level) = &args.log_level {
        overrides.push(("logging.level", level.as_str()));
    }

    EncoderConfig::load_with_overrides(args.config.as_deref(), &overrides)
}

fn log_config(config: &EncoderConfig) {
    info!("Configuration:");
    info!(
        "   Encoder: {}:{}",
        config.encoder.host, config.encoder.port
    );
    info!(
        "   Source: {} (queue `{}`, exchange `{}`, binding `{}`)",
        config.queue.source, config.queue.queue, config.queue.exchange, config.queue.binding_key
    );
    info!(
        "   Profanity filter: {}",
        if config.filter.profanity_filter_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
}

fn build_sanitizer(config: &EncoderConfig) -> Result<Sanitizer> {
    if !config.filter.profanity_filter_enabled {
        warn!("Profanity filter disabled");
        return Ok(Sanitizer::without_filter());
    }

    let path = config
        .filter
        .word_list
        .as_deref()
        .context("filter.word_list is required when the profanity filter is enabled")?;
    let filter = ProfanityFilter::load(path)
        .with_context(|| format!("Failed to load profanity word list {:?}", path))?;
    Ok(Sanitizer::new(Some(filter)))
}

async fn run(config: EncoderConfig) -> Result<()> {
    let sanitizer = build_sanitizer(&config)?;

    let endpoint: SourceEndpoint = config
        .queue
        .source
        .parse()
        .context("Invalid queue source")?;
    let mut source = endpoint
        .open()
        .await
        .context("Failed to open track source")?;

    let link = Arc::new(DeviceLink::new(config.encoder.link_config()));
    link.start();

    let pipeline = TrackPipeline::new(Arc::clone(&link), sanitizer);

    // Setup signal handling for graceful shutdown
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
        signal_token.cancel();
    });

    let summary = run_consumer(source.as_mut(), &pipeline, shutdown).await;

    link.stop().await;

    let stats = link.stats();
    info!(
        "Final stats: {} received, {} delivered, {} dropped, {} failed",
        summary.received, summary.delivered, summary.dropped, summary.failed
    );
    info!(
        "Encoder link: {} connections, {} commands sent, {} commands failed",
        stats.connections, stats.commands_sent, stats.commands_failed
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(defaults::logging::LEVEL, false);
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level, config.logging.json);
    info!("Starting RDS encoder relay v{}", env!("CARGO_PKG_VERSION"));
    log_config(&config);

    if args.check_config {
        info!("Configuration is valid");
        return;
    }

    if let Err(e) = run(config).await {
        error!("RDS encoder relay failed: {:#}", e);
        std::process::exit(1);
    }
}
