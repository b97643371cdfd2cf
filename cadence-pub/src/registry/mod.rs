/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Authoritative store of every published data point.
//!
//! [`DataPointRegistry`] owns all data points and arbitrates concurrent
//! access to them.  The scheduler is the only writer in normal operation;
//! any number of readers (a serving layer, the model simulator) may poll at
//! the same time.
//!
//! # Locking model
//!
//! ```text
//! DataPointRegistry
//! ├── index: RwLock<Index>           – written only by register()
//! │   ├── by_name: identifier → slot
//! │   └── ordered: Arc<Vec<Arc<DataPoint>>>   (copy-on-write, registration order)
//! └── DataPoint
//!     └── sample: RwLock<Sample>     – one lock per entry
//! ```
//!
//! A value and its timestamp live in the same [`Sample`] behind the entry
//! lock, so a reader can never see a value paired with the timestamp of a
//! different write.  Unrelated data points never contend with each other:
//! writes through a [`DataPointHandle`] go straight to the entry without
//! touching the index.  No atomicity across data points is provided.

pub mod error;

pub use error::RegistryError;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::{debug, info};

/// Source of per-registry ids, used to reject handles from another registry.
static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

// ── Public data structures ────────────────────────────────────────────────────

/// Consistent snapshot of one data point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Current value.  `0.0` until the first write.
    pub value: f64,

    /// Monotonic time of the last write (registration time before that).
    pub updated: Instant,

    /// Number of writes applied so far.  Strictly increases with each write,
    /// so a reader can detect ordering and count updates.
    pub sequence: u64,
}

/// Registry-issued reference to a data point.
///
/// Writing through a handle skips the identifier lookup.  A handle is only
/// valid for the registry that issued it.
#[derive(Clone)]
pub struct DataPointHandle {
    registry: u64,
    index: usize,
    point: Arc<DataPoint>,
}

impl DataPointHandle {
    /// Identifier of the data point this handle refers to.
    pub fn identifier(&self) -> &str {
        &self.point.identifier
    }

    /// Position of the data point in registration order.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl PartialEq for DataPointHandle {
    fn eq(&self, other: &Self) -> bool {
        self.registry == other.registry && self.index == other.index
    }
}

impl Eq for DataPointHandle {}

impl fmt::Debug for DataPointHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPointHandle")
            .field("registry", &self.registry)
            .field("index", &self.index)
            .field("identifier", &self.identifier())
            .finish()
    }
}

// ── Internal state ────────────────────────────────────────────────────────────

struct DataPoint {
    /// Immutable after registration.
    identifier: Arc<str>,
    sample: RwLock<Sample>,
}

#[derive(Default)]
struct Index {
    by_name: HashMap<Arc<str>, usize>,
    ordered: Arc<Vec<Arc<DataPoint>>>,
}

// ── DataPointRegistry ─────────────────────────────────────────────────────────

/// Thread-safe owner of every registered data point.
///
/// Share it between the scheduler and readers with an `Arc`.
pub struct DataPointRegistry {
    id: u64,
    index: RwLock<Index>,
}

impl DataPointRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            index: RwLock::new(Index::default()),
        }
    }

    /// Registers a new data point with value `0.0`.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateIdentifier`] if `identifier` is already
    /// registered.  The existing entry is not modified.
    pub fn register(&self, identifier: &str) -> Result<DataPointHandle, RegistryError> {
        let mut index = self.index.write();

        if index.by_name.contains_key(identifier) {
            return Err(RegistryError::DuplicateIdentifier(identifier.to_string()));
        }

        let identifier: Arc<str> = Arc::from(identifier);
        let point = Arc::new(DataPoint {
            identifier: Arc::clone(&identifier),
            sample: RwLock::new(Sample {
                value: 0.0,
                updated: Instant::now(),
                sequence: 0,
            }),
        });

        // Copies the list only while a `list()` iterator still holds it.
        let ordered = Arc::make_mut(&mut index.ordered);
        let slot = ordered.len();
        ordered.push(Arc::clone(&point));
        index.by_name.insert(identifier, slot);

        info!(identifier = %point.identifier, slot, "Registered data point");

        Ok(DataPointHandle {
            registry: self.id,
            index: slot,
            point,
        })
    }

    /// Replaces the value and timestamp of the data point behind `handle`.
    ///
    /// Returns the sample that was stored.
    ///
    /// # Errors
    /// [`RegistryError::UnknownDataPoint`] if `handle` was issued by another
    /// registry.
    pub fn write(&self, handle: &DataPointHandle, value: f64) -> Result<Sample, RegistryError> {
        self.check_handle(handle)?;

        let mut sample = handle.point.sample.write();
        let stored = Sample {
            value,
            updated: Instant::now(),
            sequence: sample.sequence + 1,
        };
        *sample = stored;

        Ok(stored)
    }

    /// Returns the current sample of `identifier`.
    ///
    /// # Errors
    /// [`RegistryError::UnknownDataPoint`] if nothing is registered under
    /// that name.
    pub fn read(&self, identifier: &str) -> Result<Sample, RegistryError> {
        let point = {
            let index = self.index.read();
            index
                .by_name
                .get(identifier)
                .map(|&slot| Arc::clone(&index.ordered[slot]))
        };

        match point {
            Some(point) => Ok(*point.sample.read()),
            None => {
                debug!(identifier, "Read of unregistered data point");
                Err(RegistryError::UnknownDataPoint(identifier.to_string()))
            }
        }
    }

    /// Returns the current sample behind `handle` without a name lookup.
    ///
    /// # Errors
    /// [`RegistryError::UnknownDataPoint`] if `handle` was issued by another
    /// registry.
    pub fn read_handle(&self, handle: &DataPointHandle) -> Result<Sample, RegistryError> {
        self.check_handle(handle)?;
        Ok(*handle.point.sample.read())
    }

    /// Lazily iterates over all identifiers in registration order.
    ///
    /// The iterator covers the points registered when `list()` was called.
    /// Clone it (or call `list()` again) to restart.
    pub fn list(&self) -> Identifiers {
        Identifiers {
            points: Arc::clone(&self.index.read().ordered),
            next: 0,
        }
    }

    /// Reads every data point in registration order.
    ///
    /// Each sample is consistent on its own.  Samples of different points
    /// may come from different ticks.
    pub fn snapshot(&self) -> Vec<(Arc<str>, Sample)> {
        let points = Arc::clone(&self.index.read().ordered);
        points
            .iter()
            .map(|p| (Arc::clone(&p.identifier), *p.sample.read()))
            .collect()
    }

    /// Number of registered data points.
    pub fn len(&self) -> usize {
        self.index.read().ordered.len()
    }

    /// Returns `true` if nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_handle(&self, handle: &DataPointHandle) -> Result<(), RegistryError> {
        if handle.registry == self.id {
            Ok(())
        } else {
            Err(RegistryError::UnknownDataPoint(
                handle.identifier().to_string(),
            ))
        }
    }
}

impl Default for DataPointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataPointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPointRegistry")
            .field("id", &self.id)
            .field("len", &self.len())
            .finish()
    }
}

// ── Identifiers ───────────────────────────────────────────────────────────────

/// Iterator returned by [`DataPointRegistry::list`].
#[derive(Clone)]
pub struct Identifiers {
    points: Arc<Vec<Arc<DataPoint>>>,
    next: usize,
}

impl Iterator for Identifiers {
    type Item = Arc<str>;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.points.get(self.next)?;
        self.next += 1;
        Some(Arc::clone(&point.identifier))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.points.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Identifiers {}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── register ──────────────────────────────────────────────────────────────

    #[test]
    fn register_starts_at_zero() {
        let reg = DataPointRegistry::new();
        let h = reg.register("Temperature").unwrap();
        assert_eq!(h.identifier(), "Temperature");

        let s = reg.read("Temperature").unwrap();
        assert_eq!(s.value, 0.0);
        assert_eq!(s.sequence, 0);
    }

    #[test]
    fn duplicate_register_fails_and_keeps_first_entry() {
        let reg = DataPointRegistry::new();
        let h = reg.register("Pressure").unwrap();
        reg.write(&h, 12.5).unwrap();

        let err = reg.register("Pressure").unwrap_err();
        assert_eq!(err, RegistryError::DuplicateIdentifier("Pressure".into()));

        let s = reg.read("Pressure").unwrap();
        assert_eq!(s.value, 12.5);
        assert_eq!(s.sequence, 1);
        assert_eq!(reg.len(), 1);
    }

    // ── read / write ──────────────────────────────────────────────────────────

    #[test]
    fn read_after_write_returns_written_value() {
        let reg = DataPointRegistry::new();
        let h = reg.register("SlowSensor").unwrap();

        let before = Instant::now();
        let stored = reg.write(&h, -4.25).unwrap();
        let s = reg.read("SlowSensor").unwrap();

        assert_eq!(s, stored);
        assert_eq!(s.value, -4.25);
        assert!(s.updated >= before);
        assert_eq!(reg.read_handle(&h).unwrap(), s);
    }

    #[test]
    fn read_unknown_identifier_fails() {
        let reg = DataPointRegistry::new();
        let err = reg.read("nope").unwrap_err();
        assert_eq!(err, RegistryError::UnknownDataPoint("nope".into()));
    }

    #[test]
    fn handle_from_another_registry_is_rejected() {
        let a = DataPointRegistry::new();
        let b = DataPointRegistry::new();
        let foreign = a.register("Temperature").unwrap();
        b.register("Temperature").unwrap();

        assert!(matches!(
            b.write(&foreign, 1.0),
            Err(RegistryError::UnknownDataPoint(ref id)) if id == "Temperature"
        ));
        assert!(b.read_handle(&foreign).is_err());
        // b's own entry is unaffected
        assert_eq!(b.read("Temperature").unwrap().sequence, 0);
    }

    #[test]
    fn timestamps_advance_with_each_write() {
        let reg = DataPointRegistry::new();
        let h = reg.register("p").unwrap();
        let first = reg.write(&h, 1.0).unwrap();
        let second = reg.write(&h, 2.0).unwrap();
        assert!(second.updated >= first.updated);
        assert_eq!(second.sequence, first.sequence + 1);
    }

    // ── list / snapshot ───────────────────────────────────────────────────────

    #[test]
    fn list_is_in_registration_order_and_restartable() {
        let reg = DataPointRegistry::new();
        for name in ["Temperature", "Pressure", "SlowSensor"] {
            reg.register(name).unwrap();
        }

        let ids = reg.list();
        assert_eq!(ids.len(), 3);
        let first: Vec<_> = ids.clone().map(|s| s.to_string()).collect();
        let again: Vec<_> = ids.map(|s| s.to_string()).collect();
        assert_eq!(first, vec!["Temperature", "Pressure", "SlowSensor"]);
        assert_eq!(first, again);
    }

    #[test]
    fn list_is_finite_while_registration_continues() {
        let reg = DataPointRegistry::new();
        reg.register("a").unwrap();
        let ids = reg.list();
        reg.register("b").unwrap();

        assert_eq!(ids.count(), 1);
        assert_eq!(reg.list().count(), 2);
    }

    #[test]
    fn snapshot_reports_every_point() {
        let reg = DataPointRegistry::new();
        let a = reg.register("a").unwrap();
        reg.register("b").unwrap();
        reg.write(&a, 3.0).unwrap();

        let snap = reg.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(&*snap[0].0, "a");
        assert_eq!(snap[0].1.value, 3.0);
        assert_eq!(&*snap[1].0, "b");
        assert_eq!(snap[1].1.value, 0.0);
    }

    // ── concurrency ───────────────────────────────────────────────────────────

    #[test]
    fn concurrent_reader_never_sees_torn_or_reordered_samples() {
        const WRITES: u64 = 20_000;
        let reg = DataPointRegistry::new();
        let h = reg.register("counter").unwrap();

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 1..=WRITES {
                    reg.write(&h, i as f64).unwrap();
                }
            });

            for _ in 0..2 {
                s.spawn(|| {
                    let mut last = 0u64;
                    while last < WRITES {
                        let sample = reg.read("counter").unwrap();
                        // value and sequence come from the same write
                        assert_eq!(sample.value, sample.sequence as f64);
                        assert!(sample.sequence >= last, "went backwards");
                        last = sample.sequence;
                    }
                });
            }
        });

        assert_eq!(reg.read("counter").unwrap().sequence, WRITES);
    }

    #[test]
    fn writers_on_different_points_are_independent() {
        let reg = DataPointRegistry::new();
        let handles: Vec<_> = (0..4)
            .map(|i| reg.register(&format!("p{i}")).unwrap())
            .collect();

        std::thread::scope(|s| {
            for h in &handles {
                let reg = &reg;
                s.spawn(move || {
                    for i in 0..1_000 {
                        reg.write(h, i as f64).unwrap();
                    }
                });
            }
        });

        for (_, sample) in reg.snapshot() {
            assert_eq!(sample.sequence, 1_000);
            assert_eq!(sample.value, 999.0);
        }
    }
}
