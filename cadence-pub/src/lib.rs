/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! cadence-pub – multi-cadence data-point publisher
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── registry/       – DataPointRegistry: per-entry locked values, handles
//! ├── cadence         – CadenceRule, Generator trait, RandomWalk
//! ├── scheduler/      – CadenceScheduler tick loop, TickDispatcher, LCM cycle
//! ├── publisher       – boundary to the protocol server (Publisher trait)
//! ├── config/         – YAML publisher configuration
//! └── setup           – config → registry + rules + scheduler
//! ```

pub mod cadence;
pub mod config;
pub mod publisher;
pub mod registry;
pub mod scheduler;
pub mod setup;
