/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cadence rules and value generators.
//!
//! A [`CadenceRule`] binds one registered data point to a period (in base
//! ticks) and a [`Generator`] that produces the next value from the previous
//! one:
//!
//! ```text
//! config::CadenceConfig ──(setup)──► CadenceRule ──(TickDispatcher)──► registry.write()
//!                                     ├─ DataPointHandle
//!                                     ├─ period_ticks ≥ 1
//!                                     └─ Box<dyn Generator>
//! ```
//!
//! # Ownership model
//! Rules are built once at startup and **moved** into the
//! [`CadenceScheduler`](crate::scheduler::CadenceScheduler).  Only the tick
//! loop touches them afterwards, so generators take `&mut self` and may keep
//! private state (e.g. an RNG) without any locking.

use rand::rngs::StdRng;
use rand::Rng;
use thiserror::Error;

use crate::publisher::PublishHandle;
use crate::registry::DataPointHandle;
use crate::scheduler::SchedulerError;

// ── Generator ─────────────────────────────────────────────────────────────────

/// Why a generator could not produce a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    /// The generator produced NaN or ±∞, e.g. after the walk overflowed.
    ///
    /// The data point keeps `previous`.
    #[error("generator produced non-finite value {produced} from {previous}")]
    NonFinite { previous: f64, produced: f64 },

    /// Generator-specific failure.
    #[error("generator failed: {0}")]
    Failed(String),

    /// A perturbation range that cannot be sampled: a non-finite bound,
    /// `min > max`, or a width `max - min` that overflows.
    #[error("invalid perturbation range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },
}

/// Maps the previous value of a data point to its next value.
///
/// Implemented for any `FnMut(f64) -> Result<f64, GeneratorError>` closure,
/// which keeps ad-hoc generators (tests, fixed patterns) short.
pub trait Generator: Send {
    fn next_value(&mut self, previous: f64) -> Result<f64, GeneratorError>;
}

impl<F> Generator for F
where
    F: FnMut(f64) -> Result<f64, GeneratorError> + Send,
{
    fn next_value(&mut self, previous: f64) -> Result<f64, GeneratorError> {
        self(previous)
    }
}

/// Random walk: `next = previous + uniform(min, max)`.
///
/// Values are not clamped and may drift without bound over long runs.
/// A degenerate range `[x, x]` is deterministic (always `+x`).
#[derive(Debug)]
pub struct RandomWalk {
    min: f64,
    max: f64,
    rng: StdRng,
}

impl RandomWalk {
    /// Creates a walk with perturbation range `[min, max]`.
    ///
    /// # Errors
    /// [`GeneratorError::InvalidRange`] if either bound is not finite,
    /// `min > max`, or `max - min` is not finite.
    pub fn new(min: f64, max: f64, rng: StdRng) -> Result<Self, GeneratorError> {
        if !min.is_finite() || !max.is_finite() || min > max || !(max - min).is_finite() {
            return Err(GeneratorError::InvalidRange { min, max });
        }
        Ok(Self { min, max, rng })
    }

    /// Perturbation range as `(min, max)`.
    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl Generator for RandomWalk {
    fn next_value(&mut self, previous: f64) -> Result<f64, GeneratorError> {
        let step = if self.min == self.max {
            self.min
        } else {
            // `max - min` is finite (checked in `new`), so this never overflows
            self.min + self.rng.gen::<f64>() * (self.max - self.min)
        };

        let produced = previous + step;
        if produced.is_finite() {
            Ok(produced)
        } else {
            Err(GeneratorError::NonFinite { previous, produced })
        }
    }
}

// ── CadenceRule ───────────────────────────────────────────────────────────────

/// Periodic update rule for one data point.
///
/// Immutable after construction apart from the generator's internal state.
pub struct CadenceRule {
    handle: DataPointHandle,
    period_ticks: u64,
    generator: Box<dyn Generator>,
    publication: Option<PublishHandle>,
}

impl CadenceRule {
    /// Creates a rule that fires every `period_ticks` base ticks.
    ///
    /// # Errors
    /// [`SchedulerError::InvalidPeriod`] if `period_ticks == 0`.
    pub fn new(
        handle: DataPointHandle,
        period_ticks: u64,
        generator: Box<dyn Generator>,
    ) -> Result<Self, SchedulerError> {
        if period_ticks == 0 {
            return Err(SchedulerError::InvalidPeriod {
                identifier: handle.identifier().to_string(),
            });
        }
        Ok(Self {
            handle,
            period_ticks,
            generator,
            publication: None,
        })
    }

    /// Forward every successful write to the publisher under `publication`.
    pub fn with_publication(mut self, publication: PublishHandle) -> Self {
        self.publication = Some(publication);
        self
    }

    /// `true` iff the rule fires on `tick` (`tick % period_ticks == 0`).
    pub fn is_due(&self, tick: u64) -> bool {
        tick % self.period_ticks == 0
    }

    pub fn identifier(&self) -> &str {
        self.handle.identifier()
    }

    pub fn handle(&self) -> &DataPointHandle {
        &self.handle
    }

    pub fn period_ticks(&self) -> u64 {
        self.period_ticks
    }

    pub fn publication(&self) -> Option<PublishHandle> {
        self.publication
    }

    pub(crate) fn generator_mut(&mut self) -> &mut dyn Generator {
        self.generator.as_mut()
    }
}

impl std::fmt::Debug for CadenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CadenceRule")
            .field("identifier", &self.identifier())
            .field("period_ticks", &self.period_ticks)
            .field("publication", &self.publication)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
