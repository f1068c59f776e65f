//! Inbound telemetry subscriptions.
//!
//! One [`Feed`] per channel, each with a liveness window derived from the
//! publisher's nominal rate (ten nominal periods, the planner/radar pair
//! gets a flat two-second window since their cadence is load-dependent).

use adas_common::car::CanFrame;
use adas_common::telemetry::{
    CameraState, DeviceState, DriverMonitoringState, JoystickState, LateralPlan,
    LiveCalibration, LiveLocationKalman, LiveParameters, LongitudinalPlan, ManagerState,
    ModelV2, PandaState, PeripheralState, PlatformLog, RadarState,
};
use crossbeam_channel::{Receiver, Sender};

use crate::config::SupervisorConfig;
use crate::hub::feed::{Channel, Feed, FeedStatus, channel};

/// Liveness window for a channel publishing at `freq_hz` (ten periods).
const fn stale_ticks(freq_hz: u64) -> u64 {
    1000 / freq_hz
}

/// Flat window for load-dependent publishers.
const LENIENT_STALE_TICKS: u64 = 200;

/// Queue depth for raw CAN frames between bus adapter and supervisor.
const CAN_QUEUE_DEPTH: usize = 1024;

/// Producer handles, given to the bus adapter and collaborator processes
/// (and to tests, which play all of those roles).
pub struct TelemetrySenders {
    pub can: Sender<CanFrame>,
    pub platform_log: Sender<PlatformLog>,
    pub device_state: Channel<DeviceState>,
    pub panda_states: Channel<Vec<PandaState>>,
    pub peripheral_state: Channel<PeripheralState>,
    pub model: Channel<ModelV2>,
    pub calibration: Channel<LiveCalibration>,
    pub driver_monitoring: Channel<DriverMonitoringState>,
    pub long_plan: Channel<LongitudinalPlan>,
    pub lat_plan: Channel<LateralPlan>,
    pub location: Channel<LiveLocationKalman>,
    pub manager: Channel<ManagerState>,
    pub live_params: Channel<LiveParameters>,
    pub radar: Channel<RadarState>,
    pub road_camera: Channel<CameraState>,
    pub driver_camera: Channel<CameraState>,
    pub wide_road_camera: Channel<CameraState>,
    pub joystick: Channel<JoystickState>,
}

/// Consumer side: all subscriptions of the supervisor.
pub struct TelemetryHub {
    pub can_rx: Receiver<CanFrame>,
    pub platform_log_rx: Receiver<PlatformLog>,
    pub device_state: Feed<DeviceState>,
    pub panda_states: Feed<Vec<PandaState>>,
    pub peripheral_state: Feed<PeripheralState>,
    pub model: Feed<ModelV2>,
    pub calibration: Feed<LiveCalibration>,
    pub driver_monitoring: Feed<DriverMonitoringState>,
    pub long_plan: Feed<LongitudinalPlan>,
    pub lat_plan: Feed<LateralPlan>,
    pub location: Feed<LiveLocationKalman>,
    pub manager: Feed<ManagerState>,
    pub live_params: Feed<LiveParameters>,
    pub radar: Feed<RadarState>,
    pub road_camera: Feed<CameraState>,
    pub driver_camera: Feed<CameraState>,
    /// Present only on wide-camera platforms.
    pub wide_road_camera: Option<Feed<CameraState>>,
    /// Present only in joystick debug mode. Never liveness-checked.
    pub joystick: Option<Feed<JoystickState>>,
}

impl TelemetryHub {
    /// Build the hub and its producer handles for the given configuration.
    pub fn new(cfg: &SupervisorConfig) -> (Self, TelemetrySenders) {
        let (can_tx, can_rx) = crossbeam_channel::bounded(CAN_QUEUE_DEPTH);
        let (log_tx, log_rx) = crossbeam_channel::unbounded();

        let (device_tx, device_rx) = channel(stale_ticks(2));
        let (panda_tx, panda_rx) = channel(stale_ticks(2));
        let (periph_tx, periph_rx) = channel(stale_ticks(2));
        let (model_tx, model_rx) = channel(stale_ticks(20));
        let (calib_tx, calib_rx) = channel(stale_ticks(4));
        let (dmon_tx, dmon_rx) = channel(stale_ticks(20));
        let (long_tx, long_rx) = channel::<LongitudinalPlan>(LENIENT_STALE_TICKS);
        let (lat_tx, lat_rx) = channel(stale_ticks(20));
        let (loc_tx, loc_rx) = channel(stale_ticks(20));
        let (mgr_tx, mgr_rx) = channel(stale_ticks(2));
        let (lp_tx, lp_rx) = channel(stale_ticks(20));
        let (radar_tx, radar_rx) = channel::<RadarState>(LENIENT_STALE_TICKS);
        let (road_cam_tx, road_cam_rx) = channel(stale_ticks(20));
        let (driver_cam_tx, driver_cam_rx) = channel(stale_ticks(20));
        let (wide_cam_tx, wide_cam_rx) = channel(stale_ticks(20));
        let (joy_tx, mut joy_rx) = channel::<JoystickState>(stale_ticks(10));
        joy_rx.set_ignore_alive(true);

        let mut driver_cam_rx: Feed<CameraState> = driver_cam_rx;
        let mut mgr_rx: Feed<ManagerState> = mgr_rx;
        if cfg.env.simulation {
            driver_cam_rx.set_ignore_alive(true);
            mgr_rx.set_ignore_alive(true);
        }

        let hub = Self {
            can_rx,
            platform_log_rx: log_rx,
            device_state: device_rx,
            panda_states: panda_rx,
            peripheral_state: periph_rx,
            model: model_rx,
            calibration: calib_rx,
            driver_monitoring: dmon_rx,
            long_plan: long_rx,
            lat_plan: lat_rx,
            location: loc_rx,
            manager: mgr_rx,
            live_params: lp_rx,
            radar: radar_rx,
            road_camera: road_cam_rx,
            driver_camera: driver_cam_rx,
            wide_road_camera: cfg.wide_camera.then_some(wide_cam_rx),
            joystick: cfg.joystick_mode.then_some(joy_rx),
        };
        let senders = TelemetrySenders {
            can: can_tx,
            platform_log: log_tx,
            device_state: device_tx,
            panda_states: panda_tx,
            peripheral_state: periph_tx,
            model: model_tx,
            calibration: calib_tx,
            driver_monitoring: dmon_tx,
            long_plan: long_tx,
            lat_plan: lat_tx,
            location: loc_tx,
            manager: mgr_tx,
            live_params: lp_tx,
            radar: radar_tx,
            road_camera: road_cam_tx,
            driver_camera: driver_cam_tx,
            wide_road_camera: wide_cam_tx,
            joystick: joy_tx,
        };
        (hub, senders)
    }

    /// Non-blocking refresh of every subscription.
    pub fn update_all(&mut self, frame: u64) {
        self.device_state.update(frame);
        self.panda_states.update(frame);
        self.peripheral_state.update(frame);
        self.model.update(frame);
        self.calibration.update(frame);
        self.driver_monitoring.update(frame);
        self.long_plan.update(frame);
        self.lat_plan.update(frame);
        self.location.update(frame);
        self.manager.update(frame);
        self.live_params.update(frame);
        self.radar.update(frame);
        self.road_camera.update(frame);
        self.driver_camera.update(frame);
        if let Some(f) = self.wide_road_camera.as_mut() {
            f.update(frame);
        }
        if let Some(f) = self.joystick.as_mut() {
            f.update(frame);
        }
    }

    /// Name → status view over every liveness-checked channel.
    fn checked(&self) -> heapless::Vec<(&'static str, &dyn FeedStatus), 20> {
        let mut v: heapless::Vec<(&'static str, &dyn FeedStatus), 20> = heapless::Vec::new();
        let _ = v.push(("deviceState", &self.device_state as &dyn FeedStatus));
        let _ = v.push(("pandaStates", &self.panda_states));
        let _ = v.push(("peripheralState", &self.peripheral_state));
        let _ = v.push(("modelV2", &self.model));
        let _ = v.push(("liveCalibration", &self.calibration));
        let _ = v.push(("driverMonitoringState", &self.driver_monitoring));
        let _ = v.push(("longitudinalPlan", &self.long_plan));
        let _ = v.push(("lateralPlan", &self.lat_plan));
        let _ = v.push(("liveLocationKalman", &self.location));
        let _ = v.push(("managerState", &self.manager));
        let _ = v.push(("liveParameters", &self.live_params));
        let _ = v.push(("radarState", &self.radar));
        let _ = v.push(("roadCameraState", &self.road_camera));
        let _ = v.push(("driverCameraState", &self.driver_camera));
        if let Some(f) = self.wide_road_camera.as_ref() {
            let _ = v.push(("wideRoadCameraState", f));
        }
        v
    }

    /// Every liveness-checked channel is fresh and marked valid.
    pub fn all_alive_and_valid(&self, frame: u64) -> bool {
        self.checked()
            .iter()
            .all(|(_, f)| f.alive(frame) && f.valid_or_exempt())
    }

    /// Channels currently failing, split into (invalid, dead) name lists.
    pub fn failing(
        &self,
        frame: u64,
    ) -> (
        heapless::Vec<&'static str, 20>,
        heapless::Vec<&'static str, 20>,
    ) {
        let mut invalid = heapless::Vec::new();
        let mut dead = heapless::Vec::new();
        for (name, f) in self.checked() {
            if !f.valid_or_exempt() {
                let _ = invalid.push(name);
            }
            if !f.alive(frame) {
                let _ = dead.push(name);
            }
        }
        (invalid, dead)
    }

    /// All camera beacons fresh (wide camera included when present).
    pub fn cameras_alive(&self, frame: u64) -> bool {
        self.road_camera.alive(frame)
            && self.driver_camera.alive(frame)
            && self
                .wide_road_camera
                .as_ref()
                .is_none_or(|f| f.alive(frame))
    }
}
