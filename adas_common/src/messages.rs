//! Outbound supervisor message schemas: `ControlsState` and the carEvents
//! batch. `CarState`, `CarControl` and `CarParams` are reused directly from
//! [`crate::car`] / [`crate::control`].

use serde::{Deserialize, Serialize};

use crate::alerts::{AlertSize, AlertStatus, AudibleAlert, VisualAlert};
use crate::control::LongControlState;
use crate::events::EventKind;

/// Engagement finite-state machine states.
///
/// Invariants: `enabled ⇔ state ∈ {PreEnabled, Enabled, SoftDisabling}`,
/// `active ⇔ state ∈ {Enabled, SoftDisabling}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngagementState {
    #[default]
    Disabled,
    PreEnabled,
    Enabled,
    SoftDisabling,
}

/// Debug record of the angle / joystick lateral paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleDebug {
    pub active: bool,
    pub steering_angle_deg: f64,
    pub output: f64,
    pub saturated: bool,
}

/// Debug record of the PID lateral controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidDebug {
    pub active: bool,
    pub p: f64,
    pub i: f64,
    pub f: f64,
    pub output: f64,
    pub saturated: bool,
}

/// Debug record of the INDI lateral controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndiDebug {
    pub active: bool,
    pub rate_setpoint: f64,
    pub accel_setpoint: f64,
    pub delayed_output: f64,
    pub delta: f64,
    pub output: f64,
    pub saturated: bool,
}

/// Debug record of the LQR lateral controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LqrDebug {
    pub active: bool,
    pub steering_angle_deg: f64,
    pub i: f64,
    pub lqr_output: f64,
    pub output: f64,
    pub saturated: bool,
}

/// Controller-specific lateral debug variant, matching the selected
/// controller (or the joystick passthrough).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LateralControlState {
    Angle(AngleDebug),
    Pid(PidDebug),
    Indi(IndiDebug),
    Lqr(LqrDebug),
    Joystick(AngleDebug),
}

impl Default for LateralControlState {
    fn default() -> Self {
        Self::Angle(AngleDebug::default())
    }
}

impl LateralControlState {
    /// Controller-reported torque saturation flag.
    pub fn saturated(&self) -> bool {
        match self {
            Self::Angle(d) | Self::Joystick(d) => d.saturated,
            Self::Pid(d) => d.saturated,
            Self::Indi(d) => d.saturated,
            Self::Lqr(d) => d.saturated,
        }
    }
}

/// Per-tick supervisor status record. Serialize-only (log direction) since
/// the alert texts are static borrows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControlsState {
    // Alert selection
    pub alert_text1: &'static str,
    pub alert_text2: &'static str,
    pub alert_status: AlertStatus,
    pub alert_size: AlertSize,
    pub alert_blinking_rate: f64,
    pub alert_sound: AudibleAlert,
    pub visual_alert: VisualAlert,

    // Engagement
    pub enabled: bool,
    pub active: bool,
    pub state: EngagementState,
    /// No NO_ENTRY event is currently blocking engagement.
    pub engageable: bool,

    // Longitudinal
    pub long_control_state: LongControlState,
    pub v_pid: f64,
    /// Published target [kph]: arbitrated apply-max when the supervisor owns
    /// longitudinal control, the raw operator target otherwise.
    pub v_cruise: f64,
    pub up_accel_cmd: f64,
    pub ui_accel_cmd: f64,
    pub uf_accel_cmd: f64,
    pub force_decel: bool,

    // Lateral
    pub curvature: f64,
    /// Offset-corrected steering angle [deg].
    pub angle_steers: f64,
    pub steer_ratio: f64,
    pub steer_actuator_delay: f64,
    pub lateral_control_state: LateralControlState,

    // Cruise arbitration echoes
    pub scc_gas_factor: f64,
    pub scc_brake_factor: f64,
    pub scc_curvature_factor: f64,
    pub road_limit_speed_active: bool,
    pub road_limit_speed: f64,
    pub road_limit_speed_left_dist: f64,

    // Loop health
    pub cum_lag_ms: f64,
    pub can_error_counter: u32,
}

/// carEvents batch: the active event kinds of one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarEventsMsg {
    pub events: heapless::Vec<EventKind, { crate::events::MAX_EVENTS }>,
}
