/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Model consumer simulator.
//!
//! Runs the publisher in-process and, concurrently, polls the registry the
//! way a downstream model would:
//!
//! ```text
//! CadenceScheduler ──write──► DataPointRegistry ◄──snapshot()── model loop
//!                                                                   │
//!                                          abs_mean / geo_mean ◄────┘
//! ```
//!
//! Usage:
//!   model-sim --config config/publisher.yaml --poll-ms 500 --duration-secs 20

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cadence_pub::config::PublisherConfig;
use cadence_pub::registry::DataPointRegistry;
use cadence_pub::setup;

#[derive(Debug, Parser)]
#[command(name = "model-sim", about = "Polls published data points and derives model values")]
struct Cli {
    /// Publisher YAML; defaults to the built-in demo cadences.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Registry polling period in milliseconds.
    #[arg(short = 'p', long = "poll-ms", default_value_t = 500)]
    poll_ms: u64,

    /// Stop the simulation after this many seconds.
    #[arg(short = 'd', long = "duration-secs", default_value_t = 20)]
    duration_secs: u64,
}

/// Derived values over the current sample of every data point.
#[derive(Debug, Clone, Copy)]
struct ModelOutput {
    abs_mean: f64,
    geo_mean: f64,
}

fn compute(values: &[f64]) -> Option<ModelOutput> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let abs_mean = values.iter().map(|v| v.abs()).sum::<f64>() / n;
    let geo_mean = values.iter().map(|v| v.abs()).product::<f64>().powf(1.0 / n);
    Some(ModelOutput { abs_mean, geo_mean })
}

fn poll(registry: &DataPointRegistry) {
    let snapshot = registry.snapshot();
    let values: Vec<f64> = snapshot.iter().map(|(_, s)| s.value).collect();
    match compute(&values) {
        Some(out) => info!(
            points = snapshot.len(),
            abs_mean = out.abs_mean,
            geo_mean = out.geo_mean,
            "Model update"
        ),
        None => warn!("Registry is empty, nothing to model"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PublisherConfig::load_from_file(path)?,
        None => PublisherConfig::default(),
    };

    let publication = setup::build(&config, None).context("Cannot assemble publisher")?;
    let registry = publication.registry;
    let scheduler = publication.scheduler;
    let tick_loop = scheduler.start()?;

    let mut interval = tokio::time::interval(Duration::from_millis(cli.poll_ms.max(1)));
    let deadline = tokio::time::sleep(Duration::from_secs(cli.duration_secs));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            _ = interval.tick() => poll(&registry),
        }
    }

    scheduler.stop();
    let summary = tick_loop.await.context("Tick loop panicked")?;
    info!(
        ticks = summary.ticks,
        writes = summary.writes,
        failures = summary.failures,
        "Simulation finished"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn three_points_give_abs_and_geometric_mean() {
        let out = compute(&[2.0, -4.0, 8.0]).unwrap();
        assert!(close(out.abs_mean, 14.0 / 3.0), "abs_mean {}", out.abs_mean);
        assert!(close(out.geo_mean, (2.0f64 * 4.0 * 8.0).cbrt()), "geo_mean {}", out.geo_mean);
        assert!(close(out.geo_mean, 4.0));
    }

    #[test]
    fn zero_value_collapses_geometric_mean() {
        let out = compute(&[0.0, 3.0, -6.0]).unwrap();
        assert!(close(out.abs_mean, 3.0));
        assert_eq!(out.geo_mean, 0.0);
    }

    #[test]
    fn empty_snapshot_has_no_output() {
        assert!(compute(&[]).is_none());
    }
}
