//! Lag-adjusted desired curvature.
//!
//! The planner can command a curvature wiggle that starts and ends inside
//! the actuator dead time, so corrections would never reach the wheel.
//! Instead of consuming the raw curvature trajectory, linearize the heading
//! trajectory at the actuator delay and limit the result to a speed-scaled
//! curvature rate.

use adas_common::consts::{CONTROL_N, T_IDXS};
use adas_common::math::interp;

/// Planner output cadence [s].
const DT_MDL: f64 = 0.05;

/// Extra delay margin on top of the actuator's own lag [s].
const DELAY_MARGIN: f64 = 0.2;

/// Max curvature rate at [0, 35] m/s — 80 deg/s and 20 deg/s of steering
/// wheel in a compact car.
const MAX_CURVATURE_RATES: [f64; 2] = [0.037_621_949_182_679_51, 0.003_441_203_371_932_992];
const MAX_CURVATURE_RATE_SPEEDS: [f64; 2] = [0.0, 35.0];

/// Compute `(desired_curvature, desired_curvature_rate)` from the lateral
/// plan's heading/curvature trajectories. Degenerate trajectories (planner
/// warm-up) yield zeros.
pub fn lag_adjusted_curvature(
    steer_actuator_delay: f64,
    v_ego: f64,
    psis: &[f64],
    curvatures: &[f64],
    curvature_rates: &[f64],
) -> (f64, f64) {
    if psis.len() != CONTROL_N
        || curvatures.len() != CONTROL_N
        || curvature_rates.len() != CONTROL_N
    {
        return (0.0, 0.0);
    }

    let delay = steer_actuator_delay + DELAY_MARGIN;
    let current_curvature = curvatures[0];
    let psi = interp(delay, &T_IDXS[..CONTROL_N], psis);
    let desired_curvature_rate = curvature_rates[0];

    // Linearize desired curvature from the heading reached at the delay
    // horizon rather than trusting the in-horizon curvature samples.
    let curvature_diff_from_psi = psi / (v_ego.max(0.1) * delay) - current_curvature;
    let desired_curvature = current_curvature + 2.0 * curvature_diff_from_psi;

    let max_curvature_rate = interp(v_ego, &MAX_CURVATURE_RATE_SPEEDS, &MAX_CURVATURE_RATES);
    let safe_rate = desired_curvature_rate.clamp(-max_curvature_rate, max_curvature_rate);
    let safe_curvature = desired_curvature.clamp(
        current_curvature - max_curvature_rate * DT_MDL,
        current_curvature + max_curvature_rate * DT_MDL,
    );
    (safe_curvature, safe_rate)
}
