//! Multi-cadence tick scheduler.
//!
//! [`CadenceScheduler`] drives one logical timer loop.  The tick counter
//! starts at `0` and increments once per base interval.  On every tick each
//! rule fires iff `tick % period_ticks == 0`, so all cadences are harmonics
//! of the base interval and never drift against each other.
//!
//! # Lifecycle
//!
//! ```text
//!            start()                 stop() / tick_limit reached / scheduler dropped
//!   Idle ───────────────► Running ──────────────────────────────────────────────► Stopped
//!     │                                                                            ▲
//!     └──────────────────────────────── stop() ────────────────────────────────────┘
//! ```
//!
//! `Stopped` is terminal: `start()` then fails with
//! [`SchedulerError::AlreadyStopped`].
//!
//! # Concurrency
//!
//! | Concern | Mechanism |
//! |---|---|
//! | Timer | `tokio::time::interval`, `MissedTickBehavior::Delay` |
//! | Stop signal | `tokio::sync::watch`, polled with `biased` priority before each tick |
//! | Tick atomicity | [`TickDispatcher::dispatch`] is synchronous; no await inside a tick |
//! | Shared values | only through [`DataPointRegistry`] (per-entry locks) |
//!
//! # Example
//! ```rust,ignore
//! let registry = Arc::new(DataPointRegistry::new());
//! let mut scheduler = CadenceScheduler::new(Arc::clone(&registry), Duration::from_millis(200))?;
//! scheduler.add_rule(rule)?;
//! let handle = scheduler.start()?;
//! // ...
//! scheduler.stop();
//! let summary = handle.await?;
//! ```

pub mod dispatch;
pub mod error;
pub mod math;

pub use dispatch::{RuleFailure, TickDispatcher, TickReport};
pub use error::{RuleError, SchedulerError};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cadence::CadenceRule;
use crate::publisher::Publisher;
use crate::registry::DataPointRegistry;

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, `start()` not called yet.
    Idle,
    /// Tick loop is running.
    Running,
    /// Terminal.
    Stopped,
}

/// Totals returned by the tick loop when it exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks dispatched.
    pub ticks: u64,
    /// Successful registry writes across all rules.
    pub writes: u64,
    /// Per-rule failures (generator, registry, or publish).
    pub failures: u64,
}

impl RunSummary {
    fn absorb(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.writes += report.written as u64;
        self.failures += report.failures.len() as u64;
    }
}

// ── Internal state ────────────────────────────────────────────────────────────

/// State visible to both the scheduler and its spawned loop.
#[derive(Debug)]
struct Shared {
    state: Mutex<SchedulerState>,
    ticks: AtomicU64,
}

// ── CadenceScheduler ──────────────────────────────────────────────────────────

/// Owns the cadence rules and runs them against a shared registry.
pub struct CadenceScheduler {
    registry: Arc<DataPointRegistry>,
    base_interval: Duration,
    tick_limit: Option<u64>,
    publisher: Option<Arc<dyn Publisher>>,
    /// Moved into the tick loop by `start()`.
    rules: Mutex<Vec<CadenceRule>>,
    shared: Arc<Shared>,
    stop_tx: watch::Sender<bool>,
}

impl CadenceScheduler {
    /// Creates an idle scheduler ticking every `base_interval`.
    ///
    /// # Errors
    /// [`SchedulerError::ZeroBaseInterval`] if `base_interval` is zero.
    pub fn new(
        registry: Arc<DataPointRegistry>,
        base_interval: Duration,
    ) -> Result<Self, SchedulerError> {
        if base_interval.is_zero() {
            return Err(SchedulerError::ZeroBaseInterval);
        }
        let (stop_tx, _) = watch::channel(false);
        Ok(Self {
            registry,
            base_interval,
            tick_limit: None,
            publisher: None,
            rules: Mutex::new(Vec::new()),
            shared: Arc::new(Shared {
                state: Mutex::new(SchedulerState::Idle),
                ticks: AtomicU64::new(0),
            }),
            stop_tx,
        })
    }

    /// Forward every successful write to `publisher`.
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Stop on its own after `ticks` ticks.
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    /// Appends `rule`.  Rules fire in the order they were added.
    ///
    /// # Errors
    /// [`SchedulerError::AlreadyRunning`] / [`SchedulerError::AlreadyStopped`]
    /// once the scheduler has left `Idle`.
    pub fn add_rule(&mut self, rule: CadenceRule) -> Result<(), SchedulerError> {
        match self.state() {
            SchedulerState::Idle => {}
            SchedulerState::Running => return Err(SchedulerError::AlreadyRunning),
            SchedulerState::Stopped => return Err(SchedulerError::AlreadyStopped),
        }
        debug!(
            identifier = rule.identifier(),
            period_ticks = rule.period_ticks(),
            "Added cadence rule"
        );
        self.rules.get_mut().push(rule);
        Ok(())
    }

    pub fn state(&self) -> SchedulerState {
        *self.shared.state.lock()
    }

    pub fn registry(&self) -> &Arc<DataPointRegistry> {
        &self.registry
    }

    pub fn base_interval(&self) -> Duration {
        self.base_interval
    }

    /// Ticks dispatched so far.
    pub fn ticks_elapsed(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    /// Spawns the tick loop on the current tokio runtime.
    ///
    /// The returned handle resolves to a [`RunSummary`] once the loop exits.
    ///
    /// # Errors
    /// * [`SchedulerError::AlreadyRunning`] – `start()` was already called.
    /// * [`SchedulerError::AlreadyStopped`] – the scheduler is terminal.
    /// * [`SchedulerError::NoRuntime`] – called outside a tokio runtime.
    pub fn start(&self) -> Result<JoinHandle<RunSummary>, SchedulerError> {
        let mut state = self.shared.state.lock();
        match *state {
            SchedulerState::Idle => {}
            SchedulerState::Running => return Err(SchedulerError::AlreadyRunning),
            SchedulerState::Stopped => return Err(SchedulerError::AlreadyStopped),
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let dispatcher = TickDispatcher::new(
            Arc::clone(&self.registry),
            std::mem::take(&mut *self.rules.lock()),
            self.publisher.clone(),
        );

        match dispatcher.cycle_ticks() {
            Some(cycle) => info!(
                rules = dispatcher.rules().len(),
                base_interval_ms = self.base_interval.as_millis() as u64,
                cycle_ticks = cycle,
                tick_limit = ?self.tick_limit,
                "Starting cadence scheduler"
            ),
            None => warn!(
                rules = dispatcher.rules().len(),
                "Starting cadence scheduler; cadence cycle exceeds u64 ticks"
            ),
        }

        let tick_loop = TickLoop {
            dispatcher,
            base_interval: self.base_interval,
            tick_limit: self.tick_limit,
            shared: Arc::clone(&self.shared),
            stop_rx: self.stop_tx.subscribe(),
        };

        *state = SchedulerState::Running;
        Ok(runtime.spawn(tick_loop.run()))
    }

    /// Moves the scheduler to `Stopped`.
    ///
    /// A running loop finishes its in-flight tick and exits before the next
    /// one.  Safe to call from any thread, any number of times.
    pub fn stop(&self) {
        let previous = {
            let mut state = self.shared.state.lock();
            std::mem::replace(&mut *state, SchedulerState::Stopped)
        };
        if previous != SchedulerState::Stopped {
            info!(from = ?previous, "Stopping cadence scheduler");
        }
        self.stop_tx.send_replace(true);
    }

    /// LCM of the periods of the rules not yet handed to the loop.
    pub fn cycle_ticks(&self) -> Option<u64> {
        math::cycle_length(self.rules.lock().iter().map(CadenceRule::period_ticks))
    }
}

impl std::fmt::Debug for CadenceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CadenceScheduler")
            .field("base_interval", &self.base_interval)
            .field("tick_limit", &self.tick_limit)
            .field("state", &self.state())
            .field("ticks", &self.ticks_elapsed())
            .finish_non_exhaustive()
    }
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

struct TickLoop {
    dispatcher: TickDispatcher,
    base_interval: Duration,
    tick_limit: Option<u64>,
    shared: Arc<Shared>,
    stop_rx: watch::Receiver<bool>,
}

impl TickLoop {
    async fn run(mut self) -> RunSummary {
        let mut interval = tokio::time::interval(self.base_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut summary = RunSummary::default();
        let mut tick: u64 = 0;

        loop {
            if self.tick_limit.is_some_and(|limit| tick >= limit) {
                info!(tick, "Tick limit reached");
                break;
            }

            tokio::select! {
                biased;
                changed = self.stop_rx.changed() => {
                    // Err: the scheduler was dropped.
                    if changed.is_err() || *self.stop_rx.borrow() {
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            if *self.stop_rx.borrow() {
                break;
            }

            debug!(tick, "tick");
            let report = self.dispatcher.dispatch(tick);
            summary.absorb(&report);

            tick += 1;
            self.shared.ticks.store(tick, Ordering::Release);
        }

        *self.shared.state.lock() = SchedulerState::Stopped;
        info!(
            ticks = summary.ticks,
            writes = summary.writes,
            failures = summary.failures,
            "Cadence scheduler stopped"
        );
        summary
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
