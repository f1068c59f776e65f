//! Inbound telemetry snapshots.
//!
//! One struct per subscribed channel. These are produced by external
//! collaborators (hardware daemon, perception, planner, localization,
//! process manager) and polled non-blocking by the supervisor each tick.

use serde::{Deserialize, Serialize};

use crate::consts::{CONTROL_N, TRAJECTORY_SIZE};
use crate::events::EventKind;

/// Device thermal band, ordered by severity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ThermalStatus {
    #[default]
    Green,
    Yellow,
    Red,
    Danger,
}

/// Compute-device health snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub battery_percent: i32,
    /// Battery is discharging although a charger should be present.
    pub charging_error: bool,
    pub thermal_status: ThermalStatus,
    pub free_space_percent: f64,
    pub memory_usage_percent: i32,
    pub fan_speed_percent_desired: i32,
}

bitflags::bitflags! {
    /// Fault word reported by a panda.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct PandaFaults: u32 {
        const RELAY_MALFUNCTION = 1 << 0;
        const RTC             = 1 << 1;
        const INTERRUPT_RATE  = 1 << 2;
        const REGISTER_DIVERGENT = 1 << 3;
    }
}

// Serialized as the raw fault word; unknown bits are preserved.
impl Serialize for PandaFaults {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for PandaFaults {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_bits_retain(u32::deserialize(deserializer)?))
    }
}

/// Per-panda safety/state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PandaState {
    pub controls_allowed: bool,
    pub safety_model: crate::car::SafetyModel,
    pub safety_param: u16,
    pub faults: PandaFaults,
}

/// Peripheral hardware generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeripheralKind {
    #[default]
    Unknown,
    /// Legacy phone-based hardware, battery powered.
    Legacy,
    /// Modern hardware with a controllable fan.
    FanEquipped,
}

/// Peripheral (harness/board) snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeripheralState {
    pub kind: PeripheralKind,
    pub fan_speed_rpm: u32,
}

/// One predicted lane line; only the closest lateral offset is consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneLine {
    /// Lateral offset of the line at x = 0 [m], left positive.
    pub y0: f64,
}

/// Model meta outputs consumed by FCW and LDW.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub hard_brake_predicted: bool,
    /// Desire probabilities, indexed by [`Desire`].
    pub desire_prediction: [f64; 8],
}

/// Model desire indices into [`ModelMeta::desire_prediction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Desire {
    LaneChangeLeft = 1,
    LaneChangeRight = 2,
}

/// Vision model snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelV2 {
    /// Predicted path, x forward [m]. Empty while the model is degraded.
    pub position_x: heapless::Vec<f64, TRAJECTORY_SIZE>,
    /// Predicted path, y left [m].
    pub position_y: heapless::Vec<f64, TRAJECTORY_SIZE>,
    /// Lane lines, outer-left to outer-right; adjacent lanes at 1 and 2.
    pub lane_lines: [LaneLine; 4],
    pub meta: ModelMeta,
    pub frame_drop_perc: f64,
}

/// Extrinsic calibration progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalStatus {
    #[default]
    Uncalibrated,
    Calibrated,
    Invalid,
}

/// Calibration snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveCalibration {
    pub cal_status: CalStatus,
}

/// Driver-monitoring snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverMonitoringState {
    pub events: heapless::Vec<EventKind, 8>,
    /// < 0 once driver attention has lapsed beyond the final warning.
    pub awareness_status: f64,
}

/// Longitudinal plan snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongitudinalPlan {
    /// Planned speed trajectory [m/s].
    pub speeds: heapless::Vec<f64, CONTROL_N>,
    /// Planned acceleration trajectory [m/s²].
    pub accels: heapless::Vec<f64, CONTROL_N>,
    pub fcw: bool,
    pub has_lead: bool,
}

/// Lane-change phase reported by the lateral planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneChangeState {
    #[default]
    Off,
    PreLaneChange,
    LaneChangeStarting,
    LaneChangeFinishing,
}

/// Intended lane-change side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaneChangeDirection {
    #[default]
    None,
    Left,
    Right,
}

/// Lateral plan snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LateralPlan {
    pub lane_change_state: LaneChangeState,
    pub lane_change_direction: LaneChangeDirection,
    pub mpc_solution_valid: bool,
    /// Heading trajectory [rad].
    pub psis: heapless::Vec<f64, CONTROL_N>,
    /// Curvature trajectory [1/m].
    pub curvatures: heapless::Vec<f64, CONTROL_N>,
    /// Curvature-rate trajectory [1/m/s].
    pub curvature_rates: heapless::Vec<f64, CONTROL_N>,
    /// Lateral offsets of the planned path from the actuator path [m].
    pub d_path_points: heapless::Vec<f64, TRAJECTORY_SIZE>,
    pub l_prob: f64,
    pub r_prob: f64,
}

/// Localization snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveLocationKalman {
    pub sensors_ok: bool,
    pub posenet_ok: bool,
    pub device_stable: bool,
    pub excessive_resets: bool,
    pub gps_ok: bool,
    /// Roll/pitch/yaw [rad]; empty until the filter converges.
    pub orientation_ned: heapless::Vec<f64, 3>,
}

/// One managed process as reported by the process manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessState {
    pub name: String,
    pub running: bool,
}

/// Process-manager snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerState {
    pub processes: Vec<ProcessState>,
}

/// Online vehicle-parameter estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveParameters {
    pub valid: bool,
    pub stiffness_factor: f64,
    pub steer_ratio: f64,
    pub angle_offset_average_deg: f64,
}

impl Default for LiveParameters {
    fn default() -> Self {
        Self {
            valid: true,
            stiffness_factor: 1.0,
            steer_ratio: 0.0,
            angle_offset_average_deg: 0.0,
        }
    }
}

/// Radar fault taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadarError {
    CanError,
    Fault,
    WrongConfig,
}

/// Closest forward target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadData {
    pub status: bool,
    /// Relative distance [m].
    pub d_rel: f64,
    /// Relative speed [m/s], negative when closing.
    pub v_rel: f64,
}

/// Radar snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarState {
    pub lead_one: LeadData,
    pub radar_errors: heapless::Vec<RadarError, 4>,
}

/// Camera liveness beacon; content is irrelevant, cadence is the signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub frame_id: u64,
}

/// Debug joystick sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoystickState {
    /// [longitudinal, lateral], each in [-1, 1].
    pub axes: heapless::Vec<f64, 8>,
    pub buttons: heapless::Vec<bool, 8>,
}

/// One line from the platform log stream (camera-stack error scanning).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformLog {
    pub message: String,
}
