//! Longitudinal controller: a PI loop with acceleration feedforward on the
//! planner's speed trajectory, plus a stopping mode that ramps into a
//! steady hold braking level.

use adas_common::car::{CarState, LongTuning};
use adas_common::consts::{CONTROL_N, DT_CTRL, T_IDXS};
use adas_common::control::LongControlState;
use adas_common::math::interp;
use adas_common::telemetry::LongitudinalPlan;

/// Speed below which a stopped target transitions into Stopping [m/s].
const STOPPING_EGO_SPEED: f64 = 0.5;

/// Target speed above which Stopping releases back into Pid [m/s].
const STARTING_TARGET_SPEED: f64 = 0.5;

/// Hold braking level while stopped [m/s²].
const STOPPING_ACCEL: f64 = -1.2;

/// Ramp rate toward the hold level [m/s³].
const STOPPING_ACCEL_RATE: f64 = 0.8;

/// Horizon at which the plan is sampled for the current target [s].
const PLAN_LOOKAHEAD: f64 = 0.15;

/// Longitudinal PI controller state, preserved across ticks.
#[derive(Debug, Clone)]
pub struct LongControl {
    pub state: LongControlState,
    /// Speed the PI loop is currently tracking [m/s].
    pub v_pid: f64,
    integral: f64,
    last_output_accel: f64,
    gains: LongTuning,
    /// Last proportional term (telemetry).
    pub p: f64,
    /// Last integral term (telemetry).
    pub i: f64,
    /// Last feedforward term (telemetry).
    pub f: f64,
}

impl LongControl {
    pub fn new(gains: LongTuning) -> Self {
        Self {
            state: LongControlState::Off,
            v_pid: 0.0,
            integral: 0.0,
            last_output_accel: 0.0,
            gains,
            p: 0.0,
            i: 0.0,
            f: 0.0,
        }
    }

    /// Zero the loop and re-seed the tracked speed.
    pub fn reset(&mut self, v_pid: f64) {
        self.v_pid = v_pid;
        self.integral = 0.0;
        self.last_output_accel = 0.0;
        self.p = 0.0;
        self.i = 0.0;
        self.f = 0.0;
    }

    /// One controller tick. `accel_limits` is the `(min, max)` window from
    /// the vehicle interface; the returned accel always lies inside it.
    pub fn update(
        &mut self,
        active: bool,
        cs: &CarState,
        plan: &LongitudinalPlan,
        accel_limits: (f64, f64),
    ) -> f64 {
        let (v_target, a_target) = if plan.speeds.len() == CONTROL_N {
            (
                interp(PLAN_LOOKAHEAD, &T_IDXS[..CONTROL_N], &plan.speeds),
                interp(PLAN_LOOKAHEAD, &T_IDXS[..CONTROL_N], &plan.accels),
            )
        } else {
            (cs.v_ego, 0.0)
        };

        self.state = self.next_state(active, cs, v_target);

        let (min_accel, max_accel) = accel_limits;
        let output = match self.state {
            LongControlState::Off => {
                self.reset(cs.v_ego);
                0.0
            }
            LongControlState::Stopping => {
                self.v_pid = cs.v_ego;
                self.integral = 0.0;
                self.p = 0.0;
                self.i = 0.0;
                self.f = 0.0;
                let ramped = self.last_output_accel - STOPPING_ACCEL_RATE * DT_CTRL;
                ramped.max(STOPPING_ACCEL).clamp(min_accel, max_accel)
            }
            LongControlState::Pid => {
                self.v_pid = v_target;
                let error = v_target - cs.v_ego;
                self.p = self.gains.kp * error;
                self.f = a_target;
                // Conditional anti-windup: hold the integral while the
                // output rails against a limit in the same direction.
                let candidate = self.integral + self.gains.ki * error * DT_CTRL;
                let raw = self.p + candidate + self.f;
                if (raw < max_accel || error < 0.0) && (raw > min_accel || error > 0.0) {
                    self.integral = candidate;
                }
                self.i = self.integral;
                (self.p + self.i + self.f).clamp(min_accel, max_accel)
            }
        };
        self.last_output_accel = output;
        output
    }

    fn next_state(&self, active: bool, cs: &CarState, v_target: f64) -> LongControlState {
        if !active {
            return LongControlState::Off;
        }
        let stopping = (cs.v_ego < STOPPING_EGO_SPEED && v_target < STOPPING_EGO_SPEED)
            || (cs.v_ego < 2.0 && cs.cruise_state.standstill);
        match self.state {
            LongControlState::Off => {
                if stopping {
                    LongControlState::Stopping
                } else {
                    LongControlState::Pid
                }
            }
            LongControlState::Pid => {
                if stopping {
                    LongControlState::Stopping
                } else {
                    LongControlState::Pid
                }
            }
            LongControlState::Stopping => {
                if v_target > STARTING_TARGET_SPEED && !cs.cruise_state.standstill {
                    LongControlState::Pid
                } else {
                    LongControlState::Stopping
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: (f64, f64) = (-3.5, 2.0);

    fn plan(v: f64, a: f64) -> LongitudinalPlan {
        let mut p = LongitudinalPlan::default();
        for _ in 0..CONTROL_N {
            let _ = p.speeds.push(v);
            let _ = p.accels.push(a);
        }
        p
    }

    fn rolling(v: f64) -> CarState {
        CarState {
            v_ego: v,
            ..CarState::default()
        }
    }

    #[test]
    fn inactive_is_off_and_zero() {
        let mut lc = LongControl::new(LongTuning::default());
        let out = lc.update(false, &rolling(20.0), &plan(25.0, 0.0), LIMITS);
        assert_eq!(out, 0.0);
        assert_eq!(lc.state, LongControlState::Off);
        assert_eq!(lc.v_pid, 20.0);
    }

    #[test]
    fn accelerates_toward_faster_target() {
        let mut lc = LongControl::new(LongTuning::default());
        let out = lc.update(true, &rolling(20.0), &plan(25.0, 0.5), LIMITS);
        assert_eq!(lc.state, LongControlState::Pid);
        assert!(out > 0.0);
        assert!(out <= LIMITS.1);
    }

    #[test]
    fn brakes_toward_slower_target() {
        let mut lc = LongControl::new(LongTuning::default());
        let out = lc.update(true, &rolling(25.0), &plan(20.0, -0.5), LIMITS);
        assert!(out < 0.0);
        assert!(out >= LIMITS.0);
    }

    #[test]
    fn integral_freezes_at_limits() {
        let mut lc = LongControl::new(LongTuning { kp: 5.0, ki: 2.0 });
        // Huge persistent error rails the output at max.
        for _ in 0..1_000 {
            let out = lc.update(true, &rolling(0.6), &plan(30.0, 0.0), LIMITS);
            assert_eq!(out, LIMITS.1);
        }
        // Integral stays bounded near what the limit window allows.
        assert!(lc.i.abs() < 10.0, "integral wound up to {}", lc.i);
    }

    #[test]
    fn stopping_ramps_to_hold_brake() {
        let mut lc = LongControl::new(LongTuning::default());
        let cs = rolling(0.2);
        let p = plan(0.0, 0.0);
        let mut out = 0.0;
        for _ in 0..300 {
            out = lc.update(true, &cs, &p, LIMITS);
        }
        assert_eq!(lc.state, LongControlState::Stopping);
        assert!((out - STOPPING_ACCEL).abs() < 1e-9);
    }

    #[test]
    fn stopping_releases_when_plan_moves() {
        let mut lc = LongControl::new(LongTuning::default());
        let stopped = rolling(0.1);
        lc.update(true, &stopped, &plan(0.0, 0.0), LIMITS);
        assert_eq!(lc.state, LongControlState::Stopping);
        lc.update(true, &stopped, &plan(2.0, 1.0), LIMITS);
        assert_eq!(lc.state, LongControlState::Pid);
    }

    #[test]
    fn degenerate_plan_tracks_current_speed() {
        let mut lc = LongControl::new(LongTuning::default());
        let out = lc.update(true, &rolling(15.0), &LongitudinalPlan::default(), LIMITS);
        // Target falls back to v_ego → zero error, zero feedforward.
        assert!(out.abs() < 1e-9);
    }
}
