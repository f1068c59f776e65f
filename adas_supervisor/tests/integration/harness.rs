//! Shared test rig: a full supervisor wired to the simulated vehicle
//! adapter, with healthy telemetry producers the tests can degrade at will.

use adas_common::car::{
    ButtonEvent, ButtonType, CanFrame, CarParams, SafetyConfig, SafetyModel,
};
use adas_common::consts::CONTROL_N;
use adas_common::events::EventKind;
use adas_common::telemetry::{
    CalStatus, DeviceState, DriverMonitoringState, LateralPlan, LiveCalibration,
    LiveLocationKalman, LiveParameters, LongitudinalPlan, ManagerState, ModelV2, PandaState,
    PeripheralKind, PeripheralState, RadarState,
};
use adas_supervisor::config::{EnvFlags, SupervisorConfig, TuningConfig};
use adas_supervisor::cruise::NoRoadLimits;
use adas_supervisor::hub::TelemetrySenders;
use adas_supervisor::hub::publishers::Outlets;
use adas_supervisor::params::ParamStore;
use adas_supervisor::supervisor::Supervisor;
use adas_supervisor::vehicle::{SimVehicle, SimVehicleHandle};

/// Fully wired supervisor under test.
pub struct Rig {
    pub sup: Supervisor,
    pub senders: TelemetrySenders,
    pub car: SimVehicleHandle,
    pub outs: Outlets,
    /// Channels the rig keeps re-feeding each tick; tests remove names to
    /// simulate dead processes.
    pub feeding: Vec<&'static str>,
    /// When set, published instead of the healthy defaults.
    pub model_override: Option<ModelV2>,
    pub radar_override: Option<RadarState>,
    pub lat_plan_override: Option<LateralPlan>,
    _params_dir: tempfile::TempDir,
}

pub fn default_config() -> SupervisorConfig {
    SupervisorConfig {
        joystick_mode: false,
        is_metric: true,
        is_ldw_enabled: false,
        community_features: true,
        adas_enabled: true,
        passive: false,
        wide_camera: false,
        tuning: TuningConfig::default(),
        env: EnvFlags::default(),
    }
}

/// Every channel the healthy rig keeps feeding.
pub fn all_channels() -> Vec<&'static str> {
    vec![
        "deviceState",
        "pandaStates",
        "peripheralState",
        "modelV2",
        "liveCalibration",
        "driverMonitoringState",
        "longitudinalPlan",
        "lateralPlan",
        "liveLocationKalman",
        "managerState",
        "liveParameters",
        "radarState",
        "roadCameraState",
        "driverCameraState",
    ]
}

pub fn recognized_car() -> CarParams {
    CarParams {
        car_name: "HYUNDAI SONATA 2020".into(),
        safety_configs: vec![SafetyConfig {
            safety_model: SafetyModel::Hyundai,
            safety_param: 0,
        }],
        ..CarParams::default()
    }
}

impl Rig {
    pub fn new() -> Self {
        Self::with(default_config(), recognized_car())
    }

    pub fn with(cfg: SupervisorConfig, cp: CarParams) -> Self {
        let params_dir = tempfile::tempdir().expect("tempdir");
        let params = ParamStore::open(params_dir.path()).expect("param store");

        let (car, handle) = SimVehicle::new(cp);
        handle.modify(|cs| {
            cs.v_ego = 20.0;
            cs.can_valid = true;
            cs.adaptive_cruise = true;
        });

        let (sup, senders) =
            Supervisor::new(Box::new(car), Box::new(NoRoadLimits), params, cfg)
                .expect("supervisor");
        let outs = sup.publishers().subscribe_all();

        Self {
            sup,
            senders,
            car: handle,
            outs,
            feeding: all_channels(),
            model_override: None,
            radar_override: None,
            lat_plan_override: None,
            _params_dir: params_dir,
        }
    }

    /// Stop re-feeding one channel (simulates a dead collaborator).
    pub fn kill_channel(&mut self, name: &'static str) {
        self.feeding.retain(|&n| n != name);
    }

    pub fn healthy_lat_plan() -> LateralPlan {
        let mut plan = LateralPlan {
            mpc_solution_valid: true,
            ..LateralPlan::default()
        };
        for _ in 0..CONTROL_N {
            let _ = plan.psis.push(0.0);
            let _ = plan.curvatures.push(0.0);
            let _ = plan.curvature_rates.push(0.0);
        }
        let _ = plan.d_path_points.push(0.0);
        plan
    }

    pub fn healthy_long_plan(v: f64) -> LongitudinalPlan {
        let mut plan = LongitudinalPlan::default();
        for _ in 0..CONTROL_N {
            let _ = plan.speeds.push(v);
            let _ = plan.accels.push(0.0);
        }
        plan
    }

    /// Publish a healthy snapshot on every still-alive channel.
    pub fn feed_telemetry(&self) {
        let s = &self.senders;
        let v_ego = 20.0;
        for &name in &self.feeding {
            match name {
                "deviceState" => s.device_state.send(DeviceState {
                    battery_percent: 100,
                    charging_error: false,
                    free_space_percent: 40.0,
                    memory_usage_percent: 30,
                    ..DeviceState::default()
                }),
                "pandaStates" => s.panda_states.send(vec![PandaState {
                    controls_allowed: true,
                    safety_model: SafetyModel::Hyundai,
                    safety_param: 0,
                    ..PandaState::default()
                }]),
                "peripheralState" => s.peripheral_state.send(PeripheralState {
                    kind: PeripheralKind::FanEquipped,
                    fan_speed_rpm: 1_200,
                }),
                "modelV2" => {
                    s.model.send(self.model_override.clone().unwrap_or_default());
                }
                "liveCalibration" => s.calibration.send(LiveCalibration {
                    cal_status: CalStatus::Calibrated,
                }),
                "driverMonitoringState" => s.driver_monitoring.send(DriverMonitoringState {
                    awareness_status: 1.0,
                    ..DriverMonitoringState::default()
                }),
                "longitudinalPlan" => s.long_plan.send(Self::healthy_long_plan(v_ego)),
                "lateralPlan" => s.lat_plan.send(
                    self.lat_plan_override.clone().unwrap_or_else(Self::healthy_lat_plan),
                ),
                "liveLocationKalman" => {
                    let mut loc = LiveLocationKalman {
                        sensors_ok: true,
                        posenet_ok: true,
                        device_stable: true,
                        excessive_resets: false,
                        gps_ok: true,
                        ..LiveLocationKalman::default()
                    };
                    let _ = loc.orientation_ned.extend_from_slice(&[0.0, 0.0, 0.0]);
                    s.location.send(loc);
                }
                "managerState" => s.manager.send(ManagerState::default()),
                "liveParameters" => s.live_params.send(LiveParameters {
                    steer_ratio: 13.5,
                    ..LiveParameters::default()
                }),
                "radarState" => {
                    s.radar.send(self.radar_override.clone().unwrap_or_default());
                }
                "roadCameraState" => s.road_camera.send(Default::default()),
                "driverCameraState" => s.driver_camera.send(Default::default()),
                other => unreachable!("unknown channel {other}"),
            }
        }
    }

    /// One full tick: telemetry refresh, one bus frame, one step.
    pub fn tick(&mut self) {
        self.feed_telemetry();
        self.senders.can.send(CanFrame::default()).expect("can queue");
        self.sup.step();
    }

    pub fn tick_n(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Run one tick with an event attached to the `CarState`.
    pub fn tick_with_event(&mut self, event: EventKind) {
        self.car.modify(|cs| {
            cs.events.clear();
            let _ = cs.events.push(event);
        });
        self.tick();
        self.car.modify(|cs| cs.events.clear());
    }

    /// Run one tick with a button edge in the `CarState`.
    pub fn tick_with_button(&mut self, button: ButtonType, pressed: bool) {
        self.car.modify(|cs| {
            cs.button_events.clear();
            let _ = cs.button_events.push(ButtonEvent { button, pressed });
        });
        self.tick();
        self.car.modify(|cs| cs.button_events.clear());
    }

    /// Engage from cold: initialize on healthy telemetry, then press the
    /// enable button.
    pub fn engage(&mut self) {
        self.tick();
        assert!(self.sup.initialized(), "healthy rig should init on tick 1");
        self.tick_with_event(EventKind::ButtonEnable);
        assert!(self.sup.engagement().enabled(), "engage failed");
    }
}
