/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Error type for [`DataPointRegistry`](super::DataPointRegistry).
//!
//! | Variant | Raised by | Meaning |
//! |---|---|---|
//! | `DuplicateIdentifier` | `register()` | configuration bug, not retryable |
//! | `UnknownDataPoint` | `read()` / `write()` / `read_handle()` | handle or name does not belong to this registry |

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// `register()` was called with an identifier that is already present.
    ///
    /// The first registration is left untouched.
    #[error("data point '{0}' is already registered")]
    DuplicateIdentifier(String),

    /// The identifier (or the identifier carried by a handle) is not known to
    /// this registry.
    ///
    /// With handles this is a programming error: a handle can only be
    /// invalid if it was issued by a different registry.
    #[error("unknown data point '{0}'")]
    UnknownDataPoint(String),
}
