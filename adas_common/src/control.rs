//! Supervisor-side output schema: the per-tick `CarControl` record consumed
//! by the vehicle-bus adapter, and its actuator/HUD sub-records.

use serde::{Deserialize, Serialize};

use crate::alerts::VisualAlert;

/// Longitudinal controller mode, echoed into `ControlsState`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongControlState {
    #[default]
    Off,
    Pid,
    Stopping,
}

/// Actuator command pair plus bookkeeping. All numeric fields are guaranteed
/// finite by the actuation orchestrator before publication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Actuators {
    /// Longitudinal acceleration request [m/s²].
    pub accel: f64,
    /// Normalized steering torque request [-1, 1].
    pub steer: f64,
    /// Steering angle request [deg] (angle-control platforms).
    pub steering_angle_deg: f64,
    pub long_control_state: LongControlState,
}

/// Request to the vehicle's own cruise module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CruiseControl {
    /// Ask the PCM to drop its cruise engagement.
    pub cancel: bool,
}

/// HUD directives rendered by the dash/UI subsystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HudControl {
    /// Displayed set-speed [m/s].
    pub set_speed: f64,
    pub speed_visible: bool,
    pub lanes_visible: bool,
    pub lead_visible: bool,
    pub left_lane_visible: bool,
    pub right_lane_visible: bool,
    pub left_lane_depart: bool,
    pub right_lane_depart: bool,
    pub visual_alert: VisualAlert,
}

/// Per-tick output record. The previous tick's instance is retained and fed
/// back to the vehicle interface on the next tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarControl {
    /// Engagement granted (state ∈ {preEnabled, enabled, softDisabling}).
    pub enabled: bool,
    /// Actuators live (state ∈ {enabled, softDisabling}).
    pub active: bool,
    pub actuators: Actuators,
    pub cruise_control: CruiseControl,
    pub hud_control: HudControl,
    /// Road roll estimate [rad], from localization when available.
    pub roll: f64,
    /// Road pitch estimate [rad], from localization when available.
    pub pitch: f64,
}
