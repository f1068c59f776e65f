//! Simulated vehicle adapter.
//!
//! Stands in for a real bus adapter on bring-up rigs and in the scenario
//! tests: the harness scripts the `CarState` through a shared handle, and
//! `apply` encodes the actuator pair into a single synthetic frame so the
//! outbound path stays observable.

use std::sync::Arc;

use adas_common::car::{CanFrame, CarParams, CarState};
use adas_common::control::CarControl;
use parking_lot::Mutex;

use super::interface::VehicleIo;

/// Synthetic frame address used for encoded actuator commands.
pub const SIM_ACTUATOR_ADDR: u32 = 0x2E4;

/// Scripting handle owned by the harness.
#[derive(Clone)]
pub struct SimVehicleHandle {
    next: Arc<Mutex<CarState>>,
}

impl SimVehicleHandle {
    /// Replace the state returned by the next `update` calls.
    pub fn set(&self, cs: CarState) {
        *self.next.lock() = cs;
    }

    /// Mutate the scripted state in place.
    pub fn modify(&self, f: impl FnOnce(&mut CarState)) {
        f(&mut self.next.lock());
    }
}

/// Simulated bus adapter.
pub struct SimVehicle {
    cp: CarParams,
    next: Arc<Mutex<CarState>>,
    init_called: bool,
}

impl SimVehicle {
    pub fn new(cp: CarParams) -> (Self, SimVehicleHandle) {
        let next = Arc::new(Mutex::new(CarState::default()));
        let handle = SimVehicleHandle { next: next.clone() };
        (
            Self {
                cp,
                next,
                init_called: false,
            },
            handle,
        )
    }

    /// Whether `init` has been called (initialization-gate observability).
    pub fn init_called(&self) -> bool {
        self.init_called
    }
}

impl VehicleIo for SimVehicle {
    fn car_params(&self) -> &CarParams {
        &self.cp
    }

    fn update(&mut self, _prev_control: &CarControl, _frames: &[CanFrame]) -> CarState {
        self.next.lock().clone()
    }

    fn apply(&mut self, control: &CarControl) -> Vec<CanFrame> {
        // Pack accel and steer as centi-units, enough to eyeball on a trace.
        let accel = (control.actuators.accel * 100.0) as i16;
        let steer = (control.actuators.steer * 100.0) as i16;
        let angle = (control.actuators.steering_angle_deg * 10.0) as i16;
        let mut data = heapless::Vec::new();
        let _ = data.extend_from_slice(&accel.to_be_bytes());
        let _ = data.extend_from_slice(&steer.to_be_bytes());
        let _ = data.extend_from_slice(&angle.to_be_bytes());
        let _ = data.push(u8::from(control.enabled) << 1 | u8::from(control.active));
        let _ = data.push(u8::from(control.cruise_control.cancel));
        vec![CanFrame {
            address: SIM_ACTUATOR_ADDR,
            data,
            src: 0,
        }]
    }

    fn accel_limits(&self, v_ego: f64, _v_target: f64) -> (f64, f64) {
        // Comfort braking floor, speed-tapered acceleration ceiling.
        let max = if v_ego < 11.0 { 2.0 } else { 1.2 };
        (-3.5, max)
    }

    fn init(&mut self) {
        self.init_called = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adas_common::control::Actuators;

    #[test]
    fn update_returns_scripted_state() {
        let (mut veh, handle) = SimVehicle::new(CarParams::default());
        handle.modify(|cs| {
            cs.v_ego = 12.5;
            cs.can_valid = true;
        });
        let cs = veh.update(&CarControl::default(), &[]);
        assert_eq!(cs.v_ego, 12.5);
        assert!(cs.can_valid);
    }

    #[test]
    fn apply_encodes_actuators() {
        let (mut veh, _handle) = SimVehicle::new(CarParams::default());
        let cc = CarControl {
            enabled: true,
            active: true,
            actuators: Actuators {
                accel: 1.5,
                steer: -0.25,
                steering_angle_deg: 4.2,
                ..Actuators::default()
            },
            ..CarControl::default()
        };
        let frames = veh.apply(&cc);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].address, SIM_ACTUATOR_ADDR);
        let d = &frames[0].data;
        assert_eq!(i16::from_be_bytes([d[0], d[1]]), 150);
        assert_eq!(i16::from_be_bytes([d[2], d[3]]), -25);
        assert_eq!(i16::from_be_bytes([d[4], d[5]]), 42);
        assert_eq!(d[6], 0b11);
    }

    #[test]
    fn accel_limits_taper_with_speed() {
        let (veh, _) = SimVehicle::new(CarParams::default());
        assert_eq!(veh.accel_limits(5.0, 10.0).1, 2.0);
        assert_eq!(veh.accel_limits(25.0, 30.0).1, 1.2);
        assert_eq!(veh.accel_limits(25.0, 30.0).0, -3.5);
    }
}
