//! Narrow contract to the vehicle-bus adapter.
//!
//! The adapter owns CAN framing, platform fingerprinting and signal decode;
//! the supervisor only ever sees `CarState` in and `CarControl` out, plus
//! one synchronous call per tick for each direction.

use adas_common::car::{CanFrame, CarParams, CarState};
use adas_common::control::CarControl;

/// Vehicle-bus adapter contract.
///
/// Implementations are stateful (they run the platform's signal parsers)
/// but must never block: `update` works purely on the frames handed to it.
pub trait VehicleIo: Send {
    /// Static platform description derived at fingerprinting.
    fn car_params(&self) -> &CarParams;

    /// Decode one tick's batch of raw frames into a `CarState`. The
    /// previous tick's `CarControl` is fed back for platforms whose parsers
    /// need the commanded state.
    fn update(&mut self, prev_control: &CarControl, frames: &[CanFrame]) -> CarState;

    /// Encode the tick's `CarControl` into bus frames.
    fn apply(&mut self, control: &CarControl) -> Vec<CanFrame>;

    /// Longitudinal acceleration window [m/s²] for the PID loop at the
    /// current speed and target.
    fn accel_limits(&self, v_ego: f64, v_target: f64) -> (f64, f64);

    /// One-time arming once the supervisor initializes (e.g. disable stock
    /// systems, start the relay). Default: nothing to do.
    fn init(&mut self) {}
}
