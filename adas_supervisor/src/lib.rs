//! # ADAS Control Supervisor
//!
//! Hard-realtime engagement and actuation supervisor. At 100 Hz it fuses
//! vehicle telemetry, perception outputs and operator inputs into a
//! finite-state engagement decision and a pair of actuator commands
//! (longitudinal acceleration, lateral steering) sent to the vehicle bus.
//!
//! ## Tick phases
//!
//! 1. **Sample** — block on the bus for raw frames, refresh telemetry
//!    snapshots, produce a `CarState`.
//! 2. **Event collection** — rebuild the event set from all sources.
//! 3. **State transition** — advance the engagement state machine and the
//!    operator set-speed.
//! 4. **Actuation** — run the longitudinal and lateral controllers (or the
//!    joystick passthrough) and arbitrate the allowed max speed.
//! 5. **Publish** — emit `CarControl`, `ControlsState`, `CarState` and the
//!    periodic `CarEvents`/`CarParams`.
//!
//! ## Zero-Allocation RT Loop
//!
//! All per-tick buffers are pre-allocated at construction. Telemetry is
//! polled from lock-guarded snapshot slots; the only blocking point per tick
//! is the 100 ms CAN read.

#![deny(clippy::disallowed_types)]

pub mod actuation;
pub mod alerts;
pub mod config;
pub mod control;
pub mod cruise;
pub mod cycle;
pub mod engagement;
pub mod events;
pub mod hub;
pub mod params;
pub mod publish;
pub mod supervisor;
pub mod vehicle;
