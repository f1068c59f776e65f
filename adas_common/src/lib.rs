//! # ADAS Common Library
//!
//! Shared data model for the ADAS workspace: per-tick message schemas,
//! system constants, unit conversions, numeric helpers, and the event/alert
//! catalog consumed by the control supervisor.
//!
//! This crate performs no I/O. Every type here is a plain value that crosses
//! the boundary between the supervisor and its collaborators (vehicle-bus
//! adapter, perception, localization, UI), so all of them are `Clone` and
//! most are `serde`-serializable for logging and replay.

#![deny(clippy::disallowed_types)]

pub mod alerts;
pub mod car;
pub mod consts;
pub mod control;
pub mod events;
pub mod math;
pub mod messages;
pub mod telemetry;
