/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use cadence_pub::config::PublisherConfig;
use cadence_pub::publisher::{Publisher, TracingPublisher};
use cadence_pub::setup;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Multi-cadence data-point publisher.
///
/// Example:
///   cadence-pub --config config/publisher.yaml --ticks 400
#[derive(Debug, Parser)]
#[command(
    name = "cadence-pub",
    about = "Publishes periodically updated data points at independent cadences",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML publisher configuration.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Override the base tick interval in milliseconds.
    #[arg(short = 'i', long = "base-interval-ms")]
    base_interval_ms: Option<u64>,

    /// Stop after this many ticks (runs until Ctrl+C otherwise).
    #[arg(short = 't', long = "ticks")]
    ticks: Option<u64>,

    /// Seed for reproducible random walks.
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        config           = ?cli.config,
        base_interval_ms = ?cli.base_interval_ms,
        ticks            = ?cli.ticks,
        seed             = ?cli.seed,
        "cadence-pub starting up"
    );

    // ── Load configuration ────────────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => match PublisherConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load publisher configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No configuration file provided, using default cadences");
            PublisherConfig::default()
        }
    };

    if let Some(ms) = cli.base_interval_ms {
        config.base_interval_ms = ms;
    }
    if cli.ticks.is_some() {
        config.tick_limit = cli.ticks;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    // ── Assemble and run ──────────────────────────────────────────────────────
    let publisher: Arc<dyn Publisher> = Arc::new(TracingPublisher::new(config.server.clone()));
    let publication = match setup::build(&config, Some(publisher)) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to assemble publisher: {:#}", e);
            process::exit(1);
        }
    };
    let scheduler = publication.scheduler;

    let mut tick_loop = match scheduler.start() {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start scheduler: {}", e);
            process::exit(1);
        }
    };

    let joined = tokio::select! {
        joined = &mut tick_loop => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received");
            scheduler.stop();
            tick_loop.await
        }
    };

    match joined {
        Ok(summary) => {
            for (identifier, sample) in publication.registry.snapshot() {
                info!(
                    identifier = %identifier,
                    value = sample.value,
                    writes = sample.sequence,
                    "Final value"
                );
            }
            info!(
                ticks = summary.ticks,
                writes = summary.writes,
                failures = summary.failures,
                "cadence-pub shut down"
            );
        }
        Err(e) => {
            error!("Tick loop terminated abnormally: {}", e);
            process::exit(1);
        }
    }
}
