//! Lateral controller family.
//!
//! One tagged variant per control strategy, selected once at construction
//! from `CarParams`. All variants share the same capability set: `reset()`
//! and a per-tick `update()` producing a normalized torque, a steering
//! angle, and a controller-specific debug record.

use adas_common::car::{CarParams, CarState, LateralTuningKind, SteerControlType};
use adas_common::consts::{DT_CTRL, cv};
use adas_common::messages::{AngleDebug, IndiDebug, LateralControlState, LqrDebug, PidDebug};
use adas_common::telemetry::LiveParameters;

use crate::vehicle::VehicleModel;

/// Output of one lateral controller tick.
#[derive(Debug, Clone, Copy)]
pub struct LatOutput {
    /// Normalized steering torque in [-1, 1] (torque platforms).
    pub steer: f64,
    /// Steering-wheel angle request [deg] (angle platforms).
    pub angle_deg: f64,
    pub debug: LateralControlState,
}

impl LatOutput {
    /// Null output with the controller's own (inactive) debug variant.
    fn inactive(cs: &CarState, debug: LateralControlState) -> Self {
        Self {
            steer: 0.0,
            angle_deg: cs.steering_angle_deg,
            debug,
        }
    }
}

/// Desired steering angle [deg] for the commanded curvature.
fn desired_angle_deg(
    vm: &VehicleModel,
    lp: &LiveParameters,
    desired_curvature: f64,
    v_ego: f64,
) -> f64 {
    vm.steer_from_curvature(-desired_curvature, v_ego) * cv::RAD_TO_DEG
        + lp.angle_offset_average_deg
}

// ─── Angle ──────────────────────────────────────────────────────────

/// Direct angle-request controller for angle-control platforms.
#[derive(Debug, Clone, Default)]
pub struct LatControlAngle;

impl LatControlAngle {
    fn update(
        &mut self,
        active: bool,
        cs: &CarState,
        vm: &VehicleModel,
        lp: &LiveParameters,
        desired_curvature: f64,
    ) -> LatOutput {
        if !active {
            let debug = LateralControlState::Angle(AngleDebug {
                active: false,
                steering_angle_deg: cs.steering_angle_deg,
                ..AngleDebug::default()
            });
            return LatOutput::inactive(cs, debug);
        }
        let angle = desired_angle_deg(vm, lp, desired_curvature, cs.v_ego);
        LatOutput {
            steer: 0.0,
            angle_deg: angle,
            debug: LateralControlState::Angle(AngleDebug {
                active: true,
                steering_angle_deg: angle,
                output: 0.0,
                saturated: false,
            }),
        }
    }
}

// ─── PID ────────────────────────────────────────────────────────────

/// PI + speed-squared feedforward on the steering-angle error.
#[derive(Debug, Clone)]
pub struct LatControlPid {
    kp: f64,
    ki: f64,
    kf: f64,
    integral: f64,
}

impl Default for LatControlPid {
    fn default() -> Self {
        Self {
            kp: 0.05,
            ki: 0.005,
            kf: 0.000_04,
            integral: 0.0,
        }
    }
}

impl LatControlPid {
    fn reset(&mut self) {
        self.integral = 0.0;
    }

    fn update(
        &mut self,
        active: bool,
        cs: &CarState,
        vm: &VehicleModel,
        lp: &LiveParameters,
        desired_curvature: f64,
    ) -> LatOutput {
        if !active {
            self.reset();
            return LatOutput::inactive(cs, LateralControlState::Pid(PidDebug::default()));
        }
        let angle_des = desired_angle_deg(vm, lp, desired_curvature, cs.v_ego);
        let error = angle_des - cs.steering_angle_deg;

        let p = self.kp * error;
        // Feedforward holds the steady-state torque for the commanded angle.
        let f = self.kf * (angle_des - lp.angle_offset_average_deg) * cs.v_ego * cs.v_ego;
        let candidate = self.integral + self.ki * error * DT_CTRL;
        let raw_candidate = p + candidate + f;
        if raw_candidate.abs() < 1.0 || error.signum() != raw_candidate.signum() {
            self.integral = candidate;
        }
        let raw = p + self.integral + f;
        let output = raw.clamp(-1.0, 1.0);

        LatOutput {
            steer: output,
            angle_deg: angle_des,
            debug: LateralControlState::Pid(PidDebug {
                active: true,
                p,
                i: self.integral,
                f,
                output,
                saturated: raw.abs() > 1.0,
            }),
        }
    }
}

// ─── INDI ───────────────────────────────────────────────────────────

/// Incremental nonlinear dynamic inversion: steps the torque by the inner
/// loop's rate error against an RC-filtered actuator estimate.
#[derive(Debug, Clone)]
pub struct LatControlIndi {
    rc: f64,
    g: f64,
    outer_gain: f64,
    inner_gain: f64,
    delayed_output: f64,
    output_steer: f64,
}

impl Default for LatControlIndi {
    fn default() -> Self {
        Self {
            rc: 0.2,
            g: 7.5,
            outer_gain: 2.0,
            inner_gain: 2.5,
            delayed_output: 0.0,
            output_steer: 0.0,
        }
    }
}

impl LatControlIndi {
    fn reset(&mut self) {
        self.delayed_output = 0.0;
        self.output_steer = 0.0;
    }

    fn update(
        &mut self,
        active: bool,
        cs: &CarState,
        vm: &VehicleModel,
        lp: &LiveParameters,
        desired_curvature: f64,
        desired_curvature_rate: f64,
    ) -> LatOutput {
        if !active {
            self.reset();
            return LatOutput::inactive(cs, LateralControlState::Indi(IndiDebug::default()));
        }
        let angle_des = desired_angle_deg(vm, lp, desired_curvature, cs.v_ego);
        let rate_des = vm.steer_from_curvature(-desired_curvature_rate, cs.v_ego) * cv::RAD_TO_DEG;

        let rate_sp = self.outer_gain * (angle_des - cs.steering_angle_deg) + rate_des;
        let accel_sp = self.inner_gain * rate_sp;
        let delta_u = accel_sp / self.g * DT_CTRL;

        let raw = self.output_steer + delta_u;
        self.output_steer = raw.clamp(-1.0, 1.0);

        let alpha = DT_CTRL / (self.rc + DT_CTRL);
        self.delayed_output += alpha * (self.output_steer - self.delayed_output);

        LatOutput {
            steer: self.output_steer,
            angle_deg: angle_des,
            debug: LateralControlState::Indi(IndiDebug {
                active: true,
                rate_setpoint: rate_sp,
                accel_setpoint: accel_sp,
                delayed_output: self.delayed_output,
                delta: delta_u,
                output: self.output_steer,
                saturated: raw.abs() > 1.0,
            }),
        }
    }
}

// ─── LQR ────────────────────────────────────────────────────────────

/// LQR on a two-state actuator model with a Luenberger observer driven by
/// the measured steering angle, plus a slow trim integrator.
#[derive(Debug, Clone)]
pub struct LatControlLqr {
    scale: f64,
    ki: f64,
    a: [[f64; 2]; 2],
    b: [f64; 2],
    c: [f64; 2],
    k: [f64; 2],
    l: [f64; 2],
    dc_gain: f64,
    x_hat: [f64; 2],
    i_lqr: f64,
}

impl Default for LatControlLqr {
    fn default() -> Self {
        Self {
            scale: 1_600.0,
            ki: 0.01,
            a: [[0.0, 1.0], [-0.226_196_43, 1.218_222_68]],
            b: [-1.920_065_85e-4, 3.956_030_32e-3],
            c: [1.0, 0.0],
            k: [-110.735_723_06, 451.227_182_55],
            l: [0.323_367_1, 0.318_575_7],
            dc_gain: 0.002_237_852_961_363_602,
            x_hat: [0.0, 0.0],
            i_lqr: 0.0,
        }
    }
}

impl LatControlLqr {
    fn reset(&mut self) {
        self.x_hat = [0.0, 0.0];
        self.i_lqr = 0.0;
    }

    fn update(
        &mut self,
        active: bool,
        cs: &CarState,
        vm: &VehicleModel,
        lp: &LiveParameters,
        desired_curvature: f64,
    ) -> LatOutput {
        if !active {
            self.reset();
            return LatOutput::inactive(cs, LateralControlState::Lqr(LqrDebug::default()));
        }
        let angle_des = desired_angle_deg(vm, lp, desired_curvature, cs.v_ego);
        let angle_no_offset = cs.steering_angle_deg - lp.angle_offset_average_deg;
        let torque_scale = (0.45 + cs.v_ego / 60.0).powi(2);

        let angle_k = self.c[0] * self.x_hat[0] + self.c[1] * self.x_hat[1];
        let e = angle_no_offset - angle_k;

        let u_lqr = (angle_des - lp.angle_offset_average_deg) / self.dc_gain
            - (self.k[0] * self.x_hat[0] + self.k[1] * self.x_hat[1]);
        let lqr_output = torque_scale * u_lqr / self.scale;

        if cs.steering_pressed {
            // Bleed the trim while the driver overrides.
            self.i_lqr *= 0.9;
        } else {
            self.i_lqr += self.ki * DT_CTRL * (angle_des - angle_k);
        }

        let raw = lqr_output + self.i_lqr;
        let output = raw.clamp(-1.0, 1.0);

        // Observer propagation, driven by the commanded torque.
        let u = output * self.scale / torque_scale.max(1e-3);
        let x0 = self.a[0][0] * self.x_hat[0] + self.a[0][1] * self.x_hat[1]
            + self.b[0] * u
            + self.l[0] * e;
        let x1 = self.a[1][0] * self.x_hat[0] + self.a[1][1] * self.x_hat[1]
            + self.b[1] * u
            + self.l[1] * e;
        self.x_hat = [x0, x1];

        LatOutput {
            steer: output,
            angle_deg: angle_des,
            debug: LateralControlState::Lqr(LqrDebug {
                active: true,
                steering_angle_deg: angle_des,
                i: self.i_lqr,
                lqr_output,
                output,
                saturated: raw.abs() > 1.0,
            }),
        }
    }
}

// ─── Dispatch ───────────────────────────────────────────────────────

/// Lateral controller selected for this platform.
#[derive(Debug, Clone)]
pub enum LatControl {
    Angle(LatControlAngle),
    Pid(LatControlPid),
    Indi(LatControlIndi),
    Lqr(LatControlLqr),
}

impl LatControl {
    /// Selection mirrors the platform description: angle platforms always
    /// get the angle controller, torque platforms their tuned family.
    pub fn from_params(cp: &CarParams) -> Self {
        if cp.steer_control_type == SteerControlType::Angle {
            return Self::Angle(LatControlAngle);
        }
        match cp.lateral_tuning {
            LateralTuningKind::Pid => Self::Pid(LatControlPid::default()),
            LateralTuningKind::Indi => Self::Indi(LatControlIndi::default()),
            LateralTuningKind::Lqr => Self::Lqr(LatControlLqr::default()),
        }
    }

    /// Drop accumulated controller state (on disengagement).
    pub fn reset(&mut self) {
        match self {
            Self::Angle(_) => {}
            Self::Pid(c) => c.reset(),
            Self::Indi(c) => c.reset(),
            Self::Lqr(c) => c.reset(),
        }
    }

    /// One controller tick.
    pub fn update(
        &mut self,
        active: bool,
        cs: &CarState,
        vm: &VehicleModel,
        lp: &LiveParameters,
        desired_curvature: f64,
        desired_curvature_rate: f64,
    ) -> LatOutput {
        match self {
            Self::Angle(c) => c.update(active, cs, vm, lp, desired_curvature),
            Self::Pid(c) => c.update(active, cs, vm, lp, desired_curvature),
            Self::Indi(c) => {
                c.update(active, cs, vm, lp, desired_curvature, desired_curvature_rate)
            }
            Self::Lqr(c) => c.update(active, cs, vm, lp, desired_curvature),
        }
    }
}
