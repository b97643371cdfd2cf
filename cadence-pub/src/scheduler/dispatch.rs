/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Synchronous dispatch of one tick.
//!
//! [`TickDispatcher::dispatch`] contains no suspension point: a tick either
//! runs to completion or is not started.  The async loop in the parent
//! module only decides *when* to call it.
//!
//! Per due rule, in registration order:
//!
//! ```text
//! read_handle() ──► generator.next_value(previous) ──► write() ──► publish_value()
//!      │                      │                          │               │
//!      └──── RuleError ───────┴──────────────────────────┘               └── RuleError
//!            (point not written, next rule continues)            (written, not published)
//! ```

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cadence::CadenceRule;
use crate::publisher::Publisher;
use crate::registry::{DataPointRegistry, Sample};

use super::error::RuleError;
use super::math::cycle_length;

// ── Reports ───────────────────────────────────────────────────────────────────

/// One rule's failure on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFailure {
    /// Index of the rule in registration order.
    pub rule: usize,
    pub identifier: String,
    pub error: RuleError,
}

/// Outcome of one dispatched tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// Indices of the rules that were due, in evaluation order.
    pub due: Vec<usize>,
    /// Registry writes that succeeded.
    pub written: usize,
    pub failures: Vec<RuleFailure>,
}

// ── TickDispatcher ────────────────────────────────────────────────────────────

/// Owns the rules and applies them to the registry one tick at a time.
pub struct TickDispatcher {
    registry: Arc<DataPointRegistry>,
    rules: Vec<CadenceRule>,
    publisher: Option<Arc<dyn Publisher>>,
}

impl TickDispatcher {
    pub fn new(
        registry: Arc<DataPointRegistry>,
        rules: Vec<CadenceRule>,
        publisher: Option<Arc<dyn Publisher>>,
    ) -> Self {
        Self {
            registry,
            rules,
            publisher,
        }
    }

    pub fn rules(&self) -> &[CadenceRule] {
        &self.rules
    }

    /// Ticks after which the firing pattern repeats (LCM of all periods).
    ///
    /// `None` if the LCM does not fit in a `u64`.
    pub fn cycle_ticks(&self) -> Option<u64> {
        cycle_length(self.rules.iter().map(CadenceRule::period_ticks))
    }

    /// Fires every rule due on `tick`.
    ///
    /// Failures are logged and returned in the report; they never prevent
    /// the remaining rules from firing.
    pub fn dispatch(&mut self, tick: u64) -> TickReport {
        let mut report = TickReport {
            tick,
            ..Default::default()
        };

        for (index, rule) in self.rules.iter_mut().enumerate() {
            if !rule.is_due(tick) {
                continue;
            }
            report.due.push(index);

            let sample = match apply(rule, &self.registry) {
                Ok(sample) => sample,
                Err(error) => {
                    warn!(
                        tick,
                        identifier = rule.identifier(),
                        error = %error,
                        "Rule skipped"
                    );
                    report.failures.push(RuleFailure {
                        rule: index,
                        identifier: rule.identifier().to_string(),
                        error,
                    });
                    continue;
                }
            };

            report.written += 1;
            debug!(
                tick,
                identifier = rule.identifier(),
                value = sample.value,
                sequence = sample.sequence,
                "Rule fired"
            );

            if let (Some(publisher), Some(publication)) =
                (self.publisher.as_deref(), rule.publication())
            {
                if let Err(e) = publisher.publish_value(publication, sample.value, sample.updated)
                {
                    warn!(
                        tick,
                        identifier = rule.identifier(),
                        error = %e,
                        "Publish failed, value kept in registry only"
                    );
                    report.failures.push(RuleFailure {
                        rule: index,
                        identifier: rule.identifier().to_string(),
                        error: e.into(),
                    });
                }
            }
        }

        report
    }
}

/// Generator + write for one rule.  The previous value comes from the
/// registry, so external corrections are picked up by the next step.
fn apply(rule: &mut CadenceRule, registry: &DataPointRegistry) -> Result<Sample, RuleError> {
    let previous = registry.read_handle(rule.handle())?.value;
    let next = rule.generator_mut().next_value(previous)?;
    Ok(registry.write(rule.handle(), next)?)
}

impl std::fmt::Debug for TickDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickDispatcher")
            .field("rules", &self.rules)
            .field("publisher", &self.publisher.is_some())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
