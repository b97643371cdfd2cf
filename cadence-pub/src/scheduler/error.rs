/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the cadence scheduler.
//!
//! Two error enums model the two failure layers:
//!
//! * [`RuleError`] — why one rule failed on one tick.  Always caught inside
//!   the tick, logged, and counted; it never stops the loop or the other
//!   rules of the same tick.
//! * [`SchedulerError`] — construction and lifecycle failures, returned
//!   synchronously to the caller.

use thiserror::Error;

use crate::cadence::GeneratorError;
use crate::publisher::PublishError;
use crate::registry::RegistryError;

// ── Per-rule, per-tick failures ───────────────────────────────────────────────

/// Failure of a single rule on a single tick.
///
/// | Variant | Effect on the data point |
/// |---|---|
/// | `Registry` | not written (stale or foreign handle) |
/// | `Generator` | not written, keeps its previous value |
/// | `Publish` | written to the registry, but not pushed outward |
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

// ── Lifecycle / construction errors ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// `start()` on a scheduler that has already reached `Stopped`.
    #[error("scheduler is stopped and cannot be restarted")]
    AlreadyStopped,

    /// `start()` on a scheduler that is already `Running`.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// `start()` was called outside a tokio runtime.
    #[error("no tokio runtime available to run the tick loop")]
    NoRuntime,

    /// A rule was built with `period_ticks == 0`.
    #[error("cadence for '{identifier}' has period_ticks = 0 (must be >= 1)")]
    InvalidPeriod { identifier: String },

    /// The base interval was zero.
    #[error("base interval must be greater than zero")]
    ZeroBaseInterval,
}
