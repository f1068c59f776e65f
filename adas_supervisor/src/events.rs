//! Per-tick event collection.
//!
//! Rebuilds the event set from scratch each tick from the just-sampled
//! `CarState`, the freshest telemetry snapshots, and the named counters
//! that survive across ticks. Pure aside from those counters: replaying
//! the same inputs yields the same set.

use adas_common::car::CarState;
use adas_common::consts::{
    CONTROLS_MISMATCH_LIMIT, CRUISE_MISMATCH_TIME, DT_CTRL, SENSOR_GRACE_TIME,
};
use adas_common::events::EventKind;
use adas_common::telemetry::{
    CalStatus, LaneChangeDirection, LaneChangeState, PandaFaults, PeripheralKind, ThermalStatus,
};
use tracing::{error, info};

use crate::supervisor::Supervisor;

/// Processes the manager may report as stopped without raising an event.
const IGNORED_PROCESSES: &[&str] = &[
    "logger",
    "uploader",
    "deleter",
    "logmessaged",
    "tombstoned",
    "statsd",
    "updated",
    "timezoned",
];

/// Camera-stack error markers scanned out of the platform log stream.
const CAMERA_LOG_ERRORS: &[&str] = &[
    "ERROR_CRC",
    "ERROR_ECC",
    "ERROR_STREAM_UNDERFLOW",
    "APPLY FAILED",
];

/// Free disk space below which engagement is blocked [%].
const MIN_FREE_SPACE_PERCENT: f64 = 7.0;

/// Memory ceiling per platform generation [%].
const MEMORY_LIMIT_LEGACY: i32 = 65;
const MEMORY_LIMIT_MODERN: i32 = 90;

/// Desired fan duty above which a stuck rotor counts as a malfunction [%].
const FAN_STUCK_DUTY: i32 = 50;

/// Window a stuck fan is tolerated before the event fires [s].
const FAN_STUCK_TIME: f64 = 5.0;

/// Model frame-drop percentage above which the model is lagging.
const FRAME_DROP_LIMIT: f64 = 20.0;

impl Supervisor {
    /// Phase 2: rebuild `self.events` for this tick.
    pub(crate) fn update_events(&mut self, cs: &CarState) {
        self.events.clear();
        self.events.add_from_msg(&cs.events);
        self.events
            .add_from_msg(&self.hub.driver_monitoring.data().events);

        for &e in &self.static_events {
            self.events.add(e);
        }
        if let Some(startup) = self.startup_event.take() {
            self.events.add(startup);
        }

        // Until the initialization gate opens, nothing else matters.
        if !self.initialized {
            self.events.add(EventKind::ControlsInitializing);
            return;
        }

        self.collect_hardware_events();
        self.collect_calibration_events();
        self.collect_lane_change_events(cs);
        self.collect_bus_events(cs);
        self.collect_perception_events();
        self.collect_cruise_events(cs);
        self.collect_camera_log_events();
    }

    fn collect_hardware_events(&mut self) {
        let device = self.hub.device_state.data();
        let peripheral = self.hub.peripheral_state.data();

        // Battery-powered legacy hardware must not engage while draining.
        if peripheral.kind == PeripheralKind::Legacy
            && device.battery_percent < 1
            && device.charging_error
        {
            self.events.add(EventKind::LowBattery);
        }
        if device.thermal_status >= ThermalStatus::Red {
            self.events.add(EventKind::Overheat);
        }
        if device.free_space_percent < MIN_FREE_SPACE_PERCENT && !self.cfg.env.simulation {
            self.events.add(EventKind::OutOfSpace);
        }
        let memory_limit = if peripheral.kind == PeripheralKind::Legacy {
            MEMORY_LIMIT_LEGACY
        } else {
            MEMORY_LIMIT_MODERN
        };
        if device.memory_usage_percent > memory_limit && !self.cfg.env.simulation {
            self.events.add(EventKind::LowMemory);
        }

        if peripheral.kind == PeripheralKind::FanEquipped {
            if peripheral.fan_speed_rpm == 0
                && device.fan_speed_percent_desired > FAN_STUCK_DUTY
            {
                let stuck_ticks = self.frame - self.last_functional_fan_frame;
                if stuck_ticks as f64 * DT_CTRL > FAN_STUCK_TIME {
                    self.events.add(EventKind::FanMalfunction);
                }
            } else {
                self.last_functional_fan_frame = self.frame;
            }
        }
    }

    fn collect_calibration_events(&mut self) {
        match self.hub.calibration.data().cal_status {
            CalStatus::Calibrated => {}
            CalStatus::Uncalibrated => self.events.add(EventKind::CalibrationIncomplete),
            CalStatus::Invalid => self.events.add(EventKind::CalibrationInvalid),
        }
    }

    fn collect_lane_change_events(&mut self, cs: &CarState) {
        let plan = self.hub.lat_plan.data();
        match plan.lane_change_state {
            LaneChangeState::PreLaneChange => {
                let direction = plan.lane_change_direction;
                let blocked = (cs.left_blindspot && direction == LaneChangeDirection::Left)
                    || (cs.right_blindspot && direction == LaneChangeDirection::Right);
                if blocked {
                    self.events.add(EventKind::LaneChangeBlocked);
                } else if direction == LaneChangeDirection::Left {
                    self.events.add(EventKind::PreLaneChangeLeft);
                } else {
                    self.events.add(EventKind::PreLaneChangeRight);
                }
            }
            LaneChangeState::LaneChangeStarting | LaneChangeState::LaneChangeFinishing => {
                self.events.add(EventKind::LaneChange);
            }
            LaneChangeState::Off => {}
        }
    }

    fn collect_bus_events(&mut self, cs: &CarState) {
        if self.can_rcv_error || !cs.can_valid {
            self.events.add(EventKind::CanError);
        }

        for (i, panda) in self.hub.panda_states.data().iter().enumerate() {
            // Every panda must match its configured safety personality;
            // extra pandas must stay silent.
            let safety_mismatch = match self.cp.safety_configs.get(i) {
                Some(cfg) => {
                    panda.safety_model != cfg.safety_model
                        || panda.safety_param != cfg.safety_param
                }
                None => !panda.safety_model.is_ignored(),
            };
            if safety_mismatch || self.mismatch_counter >= CONTROLS_MISMATCH_LIMIT {
                self.events.add(EventKind::ControlsMismatch);
            }
            if panda.faults.contains(PandaFaults::RELAY_MALFUNCTION) {
                self.events.add(EventKind::RelayMalfunction);
            }
        }

        if !self.hub.radar.data().radar_errors.is_empty() {
            self.events.add(EventKind::RadarFault);
        } else if !self.hub.panda_states.valid() {
            self.events.add(EventKind::UsbError);
        } else if !self.hub.all_alive_and_valid(self.frame) {
            self.events.add(EventKind::CommIssue);
            if !self.logged_comm_issue {
                let (invalid, dead) = self.hub.failing(self.frame);
                error!(?invalid, ?dead, "communication issue between processes");
                self.logged_comm_issue = true;
            }
        } else if self.logged_comm_issue {
            self.logged_comm_issue = false;
        }
    }

    fn collect_perception_events(&mut self) {
        if !self.hub.live_params.data().valid {
            self.events.add(EventKind::VehicleModelInvalid);
        }
        if !self.hub.lat_plan.data().mpc_solution_valid {
            self.events.add(EventKind::PlannerError);
        }

        let location = self.hub.location.data();
        if !location.sensors_ok && !self.cfg.env.nosensor {
            // Give the localizer time to receive all of its inputs.
            if self.frame as f64 * DT_CTRL > SENSOR_GRACE_TIME {
                self.events.add(EventKind::SensorDataInvalid);
            }
        }
        if !location.posenet_ok {
            self.events.add(EventKind::PosenetInvalid);
        }
        if !location.device_stable {
            self.events.add(EventKind::DeviceFalling);
        }

        if !self.cfg.env.simulation {
            if !self.hub.cameras_alive(self.frame) {
                self.events.add(EventKind::CameraMalfunction);
            }
            if self.hub.model.data().frame_drop_perc > FRAME_DROP_LIMIT {
                self.events.add(EventKind::ModeldLagging);
            }
            if self.hub.location.data().excessive_resets {
                self.events.add(EventKind::LocalizerMalfunction);
            }
            if self.hub.manager.received() {
                let stopped = self.hub.manager.data().processes.iter().any(|p| {
                    !p.running && !IGNORED_PROCESSES.contains(&p.name.as_str())
                });
                if stopped {
                    self.events.add(EventKind::ProcessNotRunning);
                }
            }
        }
    }

    fn collect_cruise_events(&mut self, cs: &CarState) {
        if !self.cfg.env.replay {
            // The PCM claiming cruise while the supervisor is disengaged
            // means the two sides disagree about who is driving.
            let cruise_mismatch = cs.cruise_state.enabled
                && (!self.engagement.enabled() || !self.cp.pcm_cruise);
            self.cruise_mismatch_counter = if cruise_mismatch {
                self.cruise_mismatch_counter + 1
            } else {
                0
            };
            if self.cruise_mismatch_counter as f64 * DT_CTRL > CRUISE_MISMATCH_TIME {
                self.events.add(EventKind::CruiseMismatch);
            }
        }

        let stock_long_is_braking = self.engagement.enabled()
            && !self.cp.supervisor_long_control
            && cs.a_ego < -1.5;
        let model_fcw = self.hub.model.data().meta.hard_brake_predicted
            && !cs.brake_pressed
            && !stock_long_is_braking;
        let planner_fcw = self.hub.long_plan.data().fcw && self.engagement.enabled();
        if planner_fcw || model_fcw {
            self.events.add(EventKind::Fcw);
        }

        if self.speed.take_sound_alert() {
            self.events.add(EventKind::SlowingDownSpeedSound);
        } else if self.speed.slowing_down_alert() {
            self.events.add(EventKind::SlowingDownSpeed);
        }
    }

    fn collect_camera_log_events(&mut self) {
        if !self.cfg.wide_camera {
            return;
        }
        while let Ok(log) = self.hub.platform_log_rx.try_recv() {
            if !CAMERA_LOG_ERRORS.iter().any(|e| log.message.contains(e)) {
                continue;
            }
            let csid = log
                .message
                .rsplit("CSID:")
                .next()
                .and_then(|s| s.split(' ').next());
            let event = match csid {
                Some("0") => Some(EventKind::RoadCameraError),
                Some("1") => Some(EventKind::WideRoadCameraError),
                Some("2") => Some(EventKind::DriverCameraError),
                _ => None,
            };
            if let Some(e) = event {
                info!(message = %log.message, "camera stream error");
                self.events.add(e);
            }
        }
    }
}
