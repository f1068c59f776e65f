//! Message hub: snapshot channels between the supervisor and its
//! collaborators.
//!
//! Single-writer, latest-value-wins slots with a sequence counter — the
//! reader polls non-blocking and tracks per-channel liveness. Raw CAN
//! frames use a real queue instead (every frame matters, and the first
//! read of a tick blocks).

pub mod feed;
pub mod publishers;
pub mod telemetry;

pub use feed::{Channel, Feed, FeedStatus, channel};
pub use publishers::{Publishers, SendCan};
pub use telemetry::{TelemetryHub, TelemetrySenders};
