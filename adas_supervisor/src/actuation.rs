//! Actuation orchestration.
//!
//! Runs the longitudinal and lateral controllers (or the joystick
//! passthrough in debug mode), detects steering saturation, and guards
//! every emitted actuator field against non-finite values.

use adas_common::car::{CarState, SteerControlType};
use adas_common::consts::{
    STEER_ANGLE_SATURATION_THRESHOLD, STEER_ANGLE_SATURATION_TIMEOUT,
    STEER_SATURATION_PATH_DEVIATION, cv,
};
use adas_common::control::Actuators;
use adas_common::events::EventKind;
use adas_common::messages::{AngleDebug, LateralControlState};
use tracing::error;

use crate::control::lag_adjusted_curvature;
use crate::supervisor::Supervisor;

/// Joystick axis-to-acceleration scale [m/s² per unit].
const JOYSTICK_ACCEL_SCALE: f64 = 4.0;

/// Joystick steering range on angle platforms [deg].
const JOYSTICK_MAX_ANGLE: f64 = 45.0;

impl Supervisor {
    /// Phase 4: produce the tick's actuator record and lateral debug log.
    pub(crate) fn state_control(&mut self, cs: &CarState) -> (Actuators, LateralControlState) {
        // Refresh the vehicle model with the live estimates.
        let live = self.hub.live_params.data().clone();
        let stiffness = live.stiffness_factor.max(0.1);
        let steer_ratio = if self.cfg.tuning.use_live_steer_ratio {
            live.steer_ratio.max(0.1)
        } else {
            self.cfg.tuning.steer_ratio.max(0.1)
        };
        self.vm.update_params(stiffness, steer_ratio);

        if cs.left_blinker || cs.right_blinker {
            self.last_blinker_frame = self.frame;
        }

        let active = self.engagement.active();
        if !active {
            self.lac.reset();
            self.loc.reset(cs.v_ego);
        }

        let mut actuators = Actuators {
            long_control_state: self.loc.state,
            ..Actuators::default()
        };
        let lac_log;

        if !self.cfg.joystick_mode {
            let limits = self
                .car
                .accel_limits(cs.v_ego, self.speed.v_cruise_kph * cv::KPH_TO_MS);
            let long_plan = self.hub.long_plan.data().clone();
            actuators.accel = self.loc.update(active, cs, &long_plan, limits);
            actuators.long_control_state = self.loc.state;

            let lat_active = active
                && !cs.steer_warning
                && !cs.steer_error
                && cs.v_ego > self.cp.min_steer_speed;
            let lat_plan = self.hub.lat_plan.data().clone();
            let (desired_curvature, desired_curvature_rate) = lag_adjusted_curvature(
                self.cfg.tuning.steer_actuator_delay,
                cs.v_ego,
                &lat_plan.psis,
                &lat_plan.curvatures,
                &lat_plan.curvature_rates,
            );
            let out = self.lac.update(
                lat_active,
                cs,
                &self.vm,
                &live,
                desired_curvature,
                desired_curvature_rate,
            );
            actuators.steer = out.steer;
            actuators.steering_angle_deg = out.angle_deg;
            lac_log = out.debug;
        } else {
            let mut debug = AngleDebug::default();
            let joystick = self.hub.joystick.as_ref().filter(|j| j.received());
            if let Some(joy) = joystick.filter(|_| active).map(|j| j.data()) {
                let axis_accel = joy.axes.first().copied().unwrap_or(0.0);
                let axis_steer = joy.axes.get(1).copied().unwrap_or(0.0);
                actuators.accel = JOYSTICK_ACCEL_SCALE * axis_accel.clamp(-1.0, 1.0);
                let steer = axis_steer.clamp(-1.0, 1.0);
                actuators.steer = steer;
                actuators.steering_angle_deg = steer * JOYSTICK_MAX_ANGLE;
                debug = AngleDebug {
                    active: true,
                    steering_angle_deg: cs.steering_angle_deg,
                    output: steer,
                    saturated: steer.abs() >= 0.9,
                };
            }
            lac_log = LateralControlState::Joystick(debug);
        }

        self.detect_steer_saturation(cs, &actuators, &lac_log);
        sanitize_actuators(&mut actuators);

        (actuators, lac_log)
    }

    /// Angle-control platforms saturate silently: compare the commanded and
    /// measured angles over time, and confirm against the planned path
    /// before alerting.
    fn detect_steer_saturation(
        &mut self,
        cs: &CarState,
        actuators: &Actuators,
        lac_log: &LateralControlState,
    ) {
        let angle_control_saturated = self.cp.steer_control_type == SteerControlType::Angle
            && (actuators.steering_angle_deg - cs.steering_angle_deg).abs()
                > STEER_ANGLE_SATURATION_THRESHOLD;

        if angle_control_saturated && !cs.steering_pressed && self.engagement.active() {
            self.saturated_count += 1;
        } else {
            self.saturated_count = 0;
        }

        let saturated = (lac_log.saturated() && !cs.steering_pressed)
            || self.saturated_count > STEER_ANGLE_SATURATION_TIMEOUT;
        if saturated {
            if let Some(&first_path_point) = self.hub.lat_plan.data().d_path_points.first() {
                let left_deviation = actuators.steer > 0.0
                    && first_path_point < -STEER_SATURATION_PATH_DEVIATION;
                let right_deviation = actuators.steer < 0.0
                    && first_path_point > STEER_SATURATION_PATH_DEVIATION;
                if left_deviation || right_deviation {
                    self.events.add(EventKind::SteerSaturated);
                }
            }
        }
    }
}

/// Replace any non-finite actuator value with 0 and log it. The state
/// machine is left untouched; the event pipeline handles disengagement.
fn sanitize_actuators(actuators: &mut Actuators) {
    for (name, value) in [
        ("accel", &mut actuators.accel),
        ("steer", &mut actuators.steer),
        ("steering_angle_deg", &mut actuators.steering_angle_deg),
    ] {
        if !value.is_finite() {
            error!(field = name, "non-finite actuator value, forcing 0");
            *value = 0.0;
        }
    }
}
