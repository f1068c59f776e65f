//! Vehicle-side schema: raw bus frames, the per-tick `CarState` snapshot and
//! the static `CarParams` the vehicle interface derives at fingerprinting.

use serde::{Deserialize, Serialize};

use crate::events::EventKind;

/// One raw CAN frame as delivered by the bus adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanFrame {
    /// Arbitration ID.
    pub address: u32,
    /// Payload bytes (classic CAN, ≤ 8).
    pub data: heapless::Vec<u8, 8>,
    /// Source bus index.
    pub src: u8,
}

/// Cruise-stalk button identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonType {
    /// Set-speed up / resume stalk.
    AccelCruise,
    /// Set-speed down / set stalk.
    DecelCruise,
    /// Cancel stalk.
    Cancel,
    /// Distance gap toggle.
    GapAdjust,
    /// Anything the interface could not classify.
    Unknown,
}

/// Edge-triggered button transition reported by the vehicle interface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub button: ButtonType,
    /// true on press edges, false on release edges.
    pub pressed: bool,
}

/// State of the vehicle's own cruise module (PCM).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CruiseState {
    pub enabled: bool,
    /// PCM displayed set-speed [m/s].
    pub speed: f64,
    pub standstill: bool,
}

/// Per-tick vehicle snapshot produced by the vehicle interface from a batch
/// of raw bus frames. Immutable after construction; one instance per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarState {
    /// Longitudinal speed [m/s].
    pub v_ego: f64,
    /// Longitudinal acceleration [m/s²].
    pub a_ego: f64,
    /// Steering wheel angle [deg].
    pub steering_angle_deg: f64,
    /// Driver torque above the override threshold.
    pub steering_pressed: bool,
    /// EPS reports a temporary steering fault.
    pub steer_warning: bool,
    /// EPS reports a permanent steering fault.
    pub steer_error: bool,
    pub brake_pressed: bool,
    pub gas_pressed: bool,
    /// Regenerative-braking paddle held.
    pub regen_pressed: bool,
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub left_blindspot: bool,
    pub right_blindspot: bool,
    pub standstill: bool,
    pub cruise_state: CruiseState,
    /// Supervisor owns the set-speed (stock cruise fully off).
    pub adaptive_cruise: bool,
    /// Bus decode healthy this tick.
    pub can_valid: bool,
    pub button_events: heapless::Vec<ButtonEvent, 8>,
    /// Events attached by the vehicle interface (engagement requests,
    /// pedal overrides, gear/door/seatbelt states, …). The supervisor
    /// republishes the full per-tick event set through this field.
    pub events: heapless::Vec<EventKind, { crate::events::MAX_EVENTS }>,
}

/// Safety firmware personality expected on a panda.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyModel {
    /// Passive listener, no TX.
    Silent,
    /// TX disabled but state reported.
    #[default]
    NoOutput,
    Hyundai,
    Gm,
    Toyota,
    Honda,
}

impl SafetyModel {
    /// Modes that are exempt from `controlsAllowed` cross-checks.
    #[inline]
    pub const fn is_ignored(self) -> bool {
        matches!(self, SafetyModel::Silent | SafetyModel::NoOutput)
    }
}

/// Expected `(model, param)` pair for one panda.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyConfig {
    pub safety_model: SafetyModel,
    pub safety_param: u16,
}

/// How the vehicle accepts lateral commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SteerControlType {
    /// EPS torque request.
    #[default]
    Torque,
    /// Direct steering-angle request.
    Angle,
}

/// Lateral tuning family selected for torque-steering platforms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LateralTuningKind {
    #[default]
    Pid,
    Indi,
    Lqr,
}

/// Longitudinal PI gains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LongTuning {
    pub kp: f64,
    pub ki: f64,
}

impl Default for LongTuning {
    fn default() -> Self {
        Self { kp: 1.0, ki: 0.1 }
    }
}

/// Static platform description produced at fingerprinting time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarParams {
    /// Platform name; "mock" when fingerprinting failed.
    pub car_name: String,
    /// Expected safety personality per panda, in bus order.
    pub safety_configs: Vec<SafetyConfig>,
    pub steer_control_type: SteerControlType,
    pub lateral_tuning: LateralTuningKind,
    pub long_tuning: LongTuning,
    /// Vehicle keeps its own cruise state machine.
    pub pcm_cruise: bool,
    /// Supervisor owns longitudinal control (vs. stock ACC).
    pub supervisor_long_control: bool,
    /// Lateral control cut-out speed [m/s].
    pub min_steer_speed: f64,
    /// Steering actuator lag [s].
    pub steer_actuator_delay: f64,
    /// Fingerprinted through a community port.
    pub community_feature: bool,
    /// Platform only supports dashcam operation.
    pub dashcam_only: bool,
    /// Number of ECUs with recognized firmware.
    pub car_fw_count: usize,

    // Bicycle-model geometry.
    /// Vehicle mass [kg].
    pub mass: f64,
    /// Wheelbase [m].
    pub wheelbase: f64,
    /// Distance from CG to front axle [m].
    pub center_to_front: f64,
    /// Front tire cornering stiffness [N/rad].
    pub tire_stiffness_front: f64,
    /// Rear tire cornering stiffness [N/rad].
    pub tire_stiffness_rear: f64,
    /// Steering rack ratio.
    pub steer_ratio: f64,
}

impl Default for CarParams {
    fn default() -> Self {
        Self {
            car_name: "mock".into(),
            safety_configs: vec![SafetyConfig::default()],
            steer_control_type: SteerControlType::default(),
            lateral_tuning: LateralTuningKind::default(),
            long_tuning: LongTuning::default(),
            pcm_cruise: false,
            supervisor_long_control: true,
            min_steer_speed: 0.0,
            steer_actuator_delay: 0.1,
            community_feature: false,
            dashcam_only: false,
            car_fw_count: 0,
            mass: 1_600.0,
            wheelbase: 2.7,
            center_to_front: 2.7 * 0.4,
            tire_stiffness_front: 192_150.0,
            tire_stiffness_rear: 202_500.0,
            steer_ratio: 13.5,
        }
    }
}

impl CarParams {
    /// Whether fingerprinting produced a real platform.
    #[inline]
    pub fn car_recognized(&self) -> bool {
        self.car_name != "mock"
    }
}
