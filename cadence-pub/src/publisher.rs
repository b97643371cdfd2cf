/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Boundary to the protocol server that exposes data points to clients.
//!
//! The server itself (framing, security, sessions, address space, transport)
//! lives outside this crate.  It is reached through two operations only:
//!
//! | Operation | Protocol meaning |
//! |---|---|
//! | [`Publisher::create_data_point`] | add a variable under the parent object |
//! | [`Publisher::publish_value`] | attribute write / value-change notification |
//!
//! [`TracingPublisher`] is the built-in collaborator: it keeps the address
//! layout the real server would expose (`<object>/<name>`) and logs every
//! value that would go out.

use std::time::Instant;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use crate::config::ServerConfig;

/// Collaborator-issued reference to an exposed data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublishHandle(pub u32);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PublishError {
    /// The handle was not issued by this publisher.
    #[error("unknown publish handle {0}")]
    UnknownHandle(u32),

    /// The server refused the operation.
    #[error("publisher rejected the request: {0}")]
    Rejected(String),
}

/// Operations the external protocol server provides.
pub trait Publisher: Send + Sync {
    /// Exposes a new addressable data point with `initial_value`.
    fn create_data_point(&self, name: &str, initial_value: f64)
        -> Result<PublishHandle, PublishError>;

    /// Pushes a new value outward.
    fn publish_value(
        &self,
        handle: PublishHandle,
        value: f64,
        timestamp: Instant,
    ) -> Result<(), PublishError>;
}

// ── TracingPublisher ──────────────────────────────────────────────────────────

/// Publisher that writes every outward value to the log.
#[derive(Debug)]
pub struct TracingPublisher {
    server: ServerConfig,
    started: Instant,
    /// Address of each created data point, indexed by handle.
    addresses: Mutex<Vec<String>>,
}

impl TracingPublisher {
    pub fn new(server: ServerConfig) -> Self {
        info!(
            endpoint      = %server.endpoint,
            name          = %server.name,
            namespace_uri = %server.namespace_uri,
            object        = %server.object,
            "Publisher endpoint"
        );
        Self {
            server,
            started: Instant::now(),
            addresses: Mutex::new(Vec::new()),
        }
    }

    /// Address of the data point behind `handle`, e.g. `Sensors/Temperature`.
    pub fn address(&self, handle: PublishHandle) -> Option<String> {
        self.addresses.lock().get(handle.0 as usize).cloned()
    }
}

impl Publisher for TracingPublisher {
    fn create_data_point(
        &self,
        name: &str,
        initial_value: f64,
    ) -> Result<PublishHandle, PublishError> {
        let mut addresses = self.addresses.lock();
        let address = format!("{}/{}", self.server.object, name);
        if addresses.contains(&address) {
            return Err(PublishError::Rejected(format!(
                "'{address}' already exists"
            )));
        }

        let handle = u32::try_from(addresses.len())
            .map(PublishHandle)
            .map_err(|_| PublishError::Rejected("address space is full".into()))?;
        info!(address = %address, initial_value, "Created data point");
        addresses.push(address);
        Ok(handle)
    }

    fn publish_value(
        &self,
        handle: PublishHandle,
        value: f64,
        timestamp: Instant,
    ) -> Result<(), PublishError> {
        let addresses = self.addresses.lock();
        let address = addresses
            .get(handle.0 as usize)
            .ok_or(PublishError::UnknownHandle(handle.0))?;

        info!(
            address = %address,
            value,
            at_ms = timestamp.saturating_duration_since(self.started).as_millis() as u64,
            "tick"
        );
        Ok(())
    }
}

// ── Test support ──────────────────────────────────────────────────────────────

/// Publisher that records every call; optionally refuses one handle.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingPublisher {
    pub created: Mutex<Vec<String>>,
    pub published: Mutex<Vec<(PublishHandle, f64, Instant)>>,
    pub refuse: Option<PublishHandle>,
}

#[cfg(test)]
impl RecordingPublisher {
    pub fn refusing(handle: PublishHandle) -> Self {
        Self {
            refuse: Some(handle),
            ..Default::default()
        }
    }

    /// Values published under `handle`, in publication order.
    pub fn values_for(&self, handle: PublishHandle) -> Vec<(f64, Instant)> {
        self.published
            .lock()
            .iter()
            .filter(|(h, _, _)| *h == handle)
            .map(|&(_, v, t)| (v, t))
            .collect()
    }
}

#[cfg(test)]
impl Publisher for RecordingPublisher {
    fn create_data_point(&self, name: &str, _initial: f64) -> Result<PublishHandle, PublishError> {
        let mut created = self.created.lock();
        created.push(name.to_string());
        Ok(PublishHandle(created.len() as u32 - 1))
    }

    fn publish_value(
        &self,
        handle: PublishHandle,
        value: f64,
        timestamp: Instant,
    ) -> Result<(), PublishError> {
        if self.refuse == Some(handle) {
            return Err(PublishError::Rejected("refused by test".into()));
        }
        self.published.lock().push((handle, value, timestamp));
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
