/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Builds a ready-to-start publisher from a [`PublisherConfig`].
//!
//! For each configured cadence, in order:
//! 1. register the data point in the registry (duplicate names fail here);
//! 2. expose it through the publisher, if one is given;
//! 3. build a [`RandomWalk`] and wrap everything in a [`CadenceRule`].

use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::cadence::{CadenceRule, RandomWalk};
use crate::config::PublisherConfig;
use crate::publisher::Publisher;
use crate::registry::DataPointRegistry;
use crate::scheduler::CadenceScheduler;

/// Registry plus an idle scheduler wired to it.
#[derive(Debug)]
pub struct Publication {
    pub registry: Arc<DataPointRegistry>,
    pub scheduler: CadenceScheduler,
}

/// Wires registry, rules and scheduler according to `config`.
///
/// # Errors
/// Fails on an invalid configuration, a duplicate cadence name
/// (`RegistryError::DuplicateIdentifier` in the chain), or a publisher that
/// refuses to create a data point.
pub fn build(config: &PublisherConfig, publisher: Option<Arc<dyn Publisher>>) -> Result<Publication> {
    config.validate()?;

    let registry = Arc::new(DataPointRegistry::new());
    let mut scheduler = CadenceScheduler::new(Arc::clone(&registry), config.base_interval())?;
    if let Some(limit) = config.tick_limit {
        scheduler = scheduler.with_tick_limit(limit);
    }
    if let Some(publisher) = &publisher {
        scheduler = scheduler.with_publisher(Arc::clone(publisher));
    }

    for (index, cadence) in config.cadences.iter().enumerate() {
        let handle = registry
            .register(&cadence.name)
            .with_context(|| format!("Cannot register cadence #{index}"))?;

        let [min, max] = cadence.perturbation_range;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
            None => StdRng::from_entropy(),
        };
        let walk = RandomWalk::new(min, max, rng)
            .with_context(|| format!("Cannot build generator for '{}'", cadence.name))?;

        let mut rule = CadenceRule::new(handle, cadence.period_ticks, Box::new(walk))?;
        if let Some(publisher) = &publisher {
            let publication = publisher
                .create_data_point(&cadence.name, 0.0)
                .with_context(|| format!("Cannot expose data point '{}'", cadence.name))?;
            rule = rule.with_publication(publication);
        }
        scheduler.add_rule(rule)?;
    }

    info!(
        data_points = registry.len(),
        base_interval_ms = config.base_interval_ms,
        cycle_ticks = ?scheduler.cycle_ticks(),
        "Publisher assembled"
    );

    Ok(Publication {
        registry,
        scheduler,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
