//! System-wide constants for the ADAS workspace.
//!
//! Single source of truth for all timing, speed and geometry limits.
//! Imported by both crates — no duplication permitted.

/// Control tick period [s] (100 Hz).
pub const DT_CTRL: f64 = 0.01;

/// Soft-disable grace window [s] before forced disengagement.
pub const SOFT_DISABLE_TIME: f64 = 3.0;

/// Soft-disable window expressed in control ticks.
pub const SOFT_DISABLE_TICKS: u32 = (SOFT_DISABLE_TIME / DT_CTRL) as u32;

/// Minimum operator cruise set-speed [kph].
pub const V_CRUISE_MIN: f64 = 30.0;

/// Maximum operator cruise set-speed [kph].
pub const V_CRUISE_MAX: f64 = 160.0;

/// Lowest set-speed seeded on engagement [kph].
pub const V_CRUISE_ENABLE_MIN: f64 = 30.0;

/// Long-press set-speed step, metric mode [kph].
pub const V_CRUISE_DELTA_KM: f64 = 10.0;

/// Long-press set-speed step, imperial mode [kph] (5 mph).
pub const V_CRUISE_DELTA_MI: f64 = 5.0 * cv::MPH_TO_KPH;

/// Ticks a cruise button must be held to count as a long press.
pub const CRUISE_LONG_PRESS: u32 = 50;

/// Number of samples in the planner's predicted path.
pub const TRAJECTORY_SIZE: usize = 33;

/// Number of samples consumed by the lateral controller.
pub const CONTROL_N: usize = 17;

/// Prediction horizon [s].
pub const HORIZON_S: f64 = 10.0;

/// Time offsets of the planner's path samples: `T_IDXS[i] = 10·(i/32)²`.
pub const T_IDXS: [f64; TRAJECTORY_SIZE] = {
    let mut t = [0.0; TRAJECTORY_SIZE];
    let mut i = 0;
    while i < TRAJECTORY_SIZE {
        let x = i as f64 / (TRAJECTORY_SIZE - 1) as f64;
        t[i] = HORIZON_S * x * x;
        i += 1;
    }
    t
};

/// Floor on the curvature-derived speed limit [m/s] (32 kph).
pub const MIN_CURVE_SPEED: f64 = 32.0 * cv::KPH_TO_MS;

/// Sentinel meaning "no curve limit in effect" [m/s].
pub const CURVE_SPEED_NONE: f64 = 255.0;

/// Curve-speed recomputation cadence [ticks] (5 Hz).
pub const CURVE_SPEED_PERIOD: u64 = 20;

/// Minimum speed for lane-departure warnings [m/s] (31 mph).
pub const LDW_MIN_SPEED: f64 = 31.0 * cv::MPH_TO_MS;

/// Model lane-change probability above which a departure is flagged.
pub const LANE_DEPARTURE_THRESHOLD: f64 = 0.1;

/// Lateral distance of the nominal lane edge from the camera [m].
pub const LANE_EDGE_OFFSET: f64 = 1.08;

/// Default lateral camera mount offset [m].
pub const CAMERA_OFFSET: f64 = 0.06;

/// Extra camera offset applied on wide-camera platforms [m].
pub const WIDE_CAMERA_OFFSET: f64 = 0.08;

/// Angle-control saturation threshold [deg].
pub const STEER_ANGLE_SATURATION_THRESHOLD: f64 = 2.5;

/// Ticks of continuous angle saturation before an alert (1 s).
pub const STEER_ANGLE_SATURATION_TIMEOUT: u32 = (1.0 / DT_CTRL) as u32;

/// Path deviation [m] that must accompany saturation to raise the alert.
pub const STEER_SATURATION_PATH_DEVIATION: f64 = 0.115;

/// Panda/supervisor `controlsAllowed` mismatch tolerance [ticks].
pub const CONTROLS_MISMATCH_LIMIT: u32 = 200;

/// PCM-cruise/supervisor mismatch tolerance [s].
pub const CRUISE_MISMATCH_TIME: f64 = 3.0;

/// Blinker cooldown window for LDW [s].
pub const BLINKER_COOLDOWN_TIME: f64 = 5.0;

/// Single-pole IIR coefficient for the displayed max-speed smoother.
///
/// Design constant, not a tunable.
pub const MAX_SPEED_SMOOTHING_KP: f64 = 0.01;

/// Grace period before sensor-validity events fire [s].
pub const SENSOR_GRACE_TIME: f64 = 5.0;

/// Initialization deadline: telemetry must settle within this window [s].
pub const INIT_TIMEOUT: f64 = 3.5;

/// Blocking CAN read timeout [ms].
pub const CAN_TIMEOUT_MS: u64 = 100;

/// carEvents republication period [ticks] (1 s).
pub const CAR_EVENTS_PERIOD: u64 = (1.0 / DT_CTRL) as u64;

/// carParams republication period [ticks] (50 s).
pub const CAR_PARAMS_PERIOD: u64 = (50.0 / DT_CTRL) as u64;

/// Unit conversion factors.
pub mod cv {
    /// km/h → m/s.
    pub const KPH_TO_MS: f64 = 1.0 / 3.6;
    /// m/s → km/h.
    pub const MS_TO_KPH: f64 = 3.6;
    /// mph → m/s.
    pub const MPH_TO_MS: f64 = 0.447_04;
    /// m/s → mph.
    pub const MS_TO_MPH: f64 = 1.0 / MPH_TO_MS;
    /// mph → km/h.
    pub const MPH_TO_KPH: f64 = 1.609_344;
    /// km/h → mph.
    pub const KPH_TO_MPH: f64 = 1.0 / MPH_TO_KPH;
    /// radians → degrees.
    pub const RAD_TO_DEG: f64 = 180.0 / core::f64::consts::PI;
    /// degrees → radians.
    pub const DEG_TO_RAD: f64 = core::f64::consts::PI / 180.0;
}

static_assertions::const_assert!(V_CRUISE_MIN < V_CRUISE_MAX);
static_assertions::const_assert!(CONTROL_N <= TRAJECTORY_SIZE);
static_assertions::const_assert_eq!(SOFT_DISABLE_TICKS, 300);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_idxs_spans_horizon() {
        assert_eq!(T_IDXS[0], 0.0);
        assert!((T_IDXS[TRAJECTORY_SIZE - 1] - HORIZON_S).abs() < 1e-12);
        // Strictly increasing.
        for w in T_IDXS.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn conversions_round_trip() {
        let v = 27.3;
        assert!((v * cv::KPH_TO_MS * cv::MS_TO_KPH - v).abs() < 1e-12);
        assert!((v * cv::MPH_TO_MS * cv::MS_TO_MPH - v).abs() < 1e-12);
        assert!((v * cv::MPH_TO_KPH * cv::KPH_TO_MPH - v).abs() < 1e-12);
    }

    #[test]
    fn derived_tick_counts() {
        assert_eq!(SOFT_DISABLE_TICKS, 300);
        assert_eq!(STEER_ANGLE_SATURATION_TIMEOUT, 100);
        assert_eq!(CAR_EVENTS_PERIOD, 100);
        assert_eq!(CAR_PARAMS_PERIOD, 5000);
    }

    #[test]
    fn curve_speed_floor_below_sentinel() {
        assert!(MIN_CURVE_SPEED < CURVE_SPEED_NONE);
        assert!((MIN_CURVE_SPEED - 8.888).abs() < 0.01);
    }
}
