//! Supervisor assembly and the per-tick phase sequence.
//!
//! `Supervisor::step` runs the five phases in fixed order — Sample,
//! UpdateEvents, StateTransition (gated on initialized ∧ ¬read-only),
//! StateControl, Publish — then the button-timer bookkeeping. `run` wraps
//! `step` in the endless paced loop.

use std::time::Duration;

use adas_common::car::{CanFrame, CarParams, CarState, SafetyConfig};
use adas_common::consts::{CAN_TIMEOUT_MS, DT_CTRL, INIT_TIMEOUT};
use adas_common::control::CarControl;
use adas_common::events::{AlertClass, EventKind, EventSet, MAX_EVENTS};
use tracing::info;

use crate::alerts::AlertManager;
use crate::config::{ConfigError, SupervisorConfig};
use crate::control::{LatControl, LongControl};
use crate::cruise::{RoadSpeedLimiter, SpeedLimiter};
use crate::cycle::Ratekeeper;
use crate::engagement::{AlertClasses, Engagement};
use crate::hub::{Publishers, TelemetryHub, TelemetrySenders};
use crate::params::{ParamError, ParamStore};
use crate::vehicle::{VehicleIo, VehicleModel};

/// Construction-time failure.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Params(#[from] ParamError),
    #[error("car params serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Upper bound on bus frames drained per tick.
const CAN_DRAIN_LIMIT: usize = 1024;

/// The 100 Hz control supervisor.
pub struct Supervisor {
    pub(crate) cfg: SupervisorConfig,
    pub(crate) params: ParamStore,
    pub(crate) hub: TelemetryHub,
    pub(crate) pubs: Publishers,
    pub(crate) car: Box<dyn VehicleIo>,
    pub(crate) cp: CarParams,
    pub(crate) road_limiter: Box<dyn RoadSpeedLimiter>,

    pub(crate) read_only: bool,
    pub(crate) initialized: bool,
    pub(crate) frame: u64,

    pub(crate) events: EventSet,
    pub(crate) events_prev: heapless::Vec<EventKind, MAX_EVENTS>,
    pub(crate) static_events: heapless::Vec<EventKind, 4>,
    pub(crate) startup_event: Option<EventKind>,
    pub(crate) current_alert_classes: AlertClasses,
    pub(crate) am: AlertManager,

    pub(crate) engagement: Engagement,
    pub(crate) speed: SpeedLimiter,

    pub(crate) loc: LongControl,
    pub(crate) lac: LatControl,
    pub(crate) vm: VehicleModel,

    pub(crate) cc_prev: CarControl,

    pub(crate) can_rcv_error: bool,
    pub(crate) can_error_counter: u32,
    pub(crate) mismatch_counter: u32,
    pub(crate) cruise_mismatch_counter: u32,
    pub(crate) saturated_count: u32,
    pub(crate) distance_traveled: f64,
    pub(crate) last_blinker_frame: u64,
    pub(crate) last_functional_fan_frame: u64,
    pub(crate) logged_comm_issue: bool,

    pub(crate) rk: Ratekeeper,
    can_frames: Vec<CanFrame>,
}

impl Supervisor {
    /// Assemble a supervisor. Returns the telemetry producer handles for
    /// the bus adapter, collaborator processes, or the test harness.
    pub fn new(
        car: Box<dyn VehicleIo>,
        road_limiter: Box<dyn RoadSpeedLimiter>,
        params: ParamStore,
        cfg: SupervisorConfig,
    ) -> Result<(Self, TelemetrySenders), SupervisorError> {
        let mut cp = car.car_params().clone();

        let car_recognized = cp.car_recognized();
        let passive = cfg.passive || !cfg.adas_enabled;
        let controller_available = !passive && !cp.dashcam_only;
        let community_disallowed = cp.community_feature && !cfg.community_features;
        let read_only = !car_recognized || !controller_available || community_disallowed;
        if read_only {
            // A read-only supervisor must never arm the safety firmware.
            cp.safety_configs = vec![SafetyConfig::default()];
        }

        let cp_json = serde_json::to_string(&cp)?;
        params.put("CarParams", &cp_json)?;
        params.put_nonblocking("CarParamsCache", cp_json);

        let mut static_events = heapless::Vec::new();
        let mut startup_event = Some(if !car_recognized {
            EventKind::StartupNoCar
        } else if !controller_available {
            EventKind::StartupNoControl
        } else {
            EventKind::Startup
        });
        if community_disallowed && car_recognized && !cp.dashcam_only {
            let _ = static_events.push(EventKind::CommunityFeatureDisallowed);
        }
        if !car_recognized {
            let _ = static_events.push(EventKind::CarUnrecognized);
        } else if read_only {
            let _ = static_events.push(EventKind::DashcamMode);
        } else if cfg.joystick_mode {
            let _ = static_events.push(EventKind::JoystickDebug);
            startup_event = None;
        }

        let (hub, senders) = TelemetryHub::new(&cfg);
        let speed = SpeedLimiter::new(cfg.is_metric, &cfg.tuning);
        let mut current_alert_classes = AlertClasses::new();
        let _ = current_alert_classes.push(AlertClass::Permanent);

        info!(
            car = %cp.car_name,
            fw_ecus = cp.car_fw_count,
            read_only,
            joystick = cfg.joystick_mode,
            "supervisor constructed"
        );

        let supervisor = Self {
            loc: LongControl::new(cp.long_tuning),
            lac: LatControl::from_params(&cp),
            vm: VehicleModel::new(&cp),
            cfg,
            params,
            hub,
            pubs: Publishers::new(),
            car,
            cp,
            road_limiter,
            read_only,
            initialized: false,
            frame: 0,
            events: EventSet::new(),
            events_prev: heapless::Vec::new(),
            static_events,
            startup_event,
            current_alert_classes,
            am: AlertManager::new(),
            engagement: Engagement::new(),
            speed,
            cc_prev: CarControl::default(),
            can_rcv_error: false,
            can_error_counter: 0,
            mismatch_counter: 0,
            cruise_mismatch_counter: 0,
            saturated_count: 0,
            distance_traveled: 0.0,
            last_blinker_frame: 0,
            last_functional_fan_frame: 0,
            logged_comm_issue: false,
            rk: Ratekeeper::new(1.0 / DT_CTRL),
            can_frames: Vec::with_capacity(CAN_DRAIN_LIMIT),
        };
        Ok((supervisor, senders))
    }

    /// Ticks executed so far.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    #[inline]
    pub fn engagement(&self) -> &Engagement {
        &self.engagement
    }

    #[inline]
    pub fn speed(&self) -> &SpeedLimiter {
        &self.speed
    }

    #[inline]
    pub fn events(&self) -> &EventSet {
        &self.events
    }

    /// Outbound channel bundle (consumers attach via subscribe).
    #[inline]
    pub fn publishers(&self) -> &Publishers {
        &self.pubs
    }

    /// Odometer since start [m].
    #[inline]
    pub fn distance_traveled(&self) -> f64 {
        self.distance_traveled
    }

    // ─── Phase 1: Sample ────────────────────────────────────────────

    /// Block on the bus for one frame batch, refresh every subscription,
    /// and decode the tick's `CarState`.
    pub(crate) fn data_sample(&mut self) -> CarState {
        self.frame += 1;

        self.can_frames.clear();
        let first = if self.cfg.env.no_can_timeout {
            self.hub.can_rx.recv().ok()
        } else {
            self.hub
                .can_rx
                .recv_timeout(Duration::from_millis(CAN_TIMEOUT_MS))
                .ok()
        };
        if let Some(frame) = first {
            self.can_frames.push(frame);
            while self.can_frames.len() < CAN_DRAIN_LIMIT {
                match self.hub.can_rx.try_recv() {
                    Ok(f) => self.can_frames.push(f),
                    Err(_) => break,
                }
            }
        }

        let cs = self.car.update(&self.cc_prev, &self.can_frames);
        self.hub.update_all(self.frame);

        let all_valid = cs.can_valid && self.hub.all_alive_and_valid(self.frame);
        if !self.initialized
            && (all_valid
                || self.frame as f64 * DT_CTRL > INIT_TIMEOUT
                || self.cfg.env.simulation)
        {
            if !self.read_only {
                self.car.init();
            }
            self.initialized = true;
            self.params.put_bool_nonblocking("ControlsReady", true);
            info!(frame = self.frame, "supervisor initialized");
        }

        if self.can_frames.is_empty() {
            self.can_error_counter += 1;
            self.can_rcv_error = true;
        } else {
            self.can_rcv_error = false;
        }

        // The panda's controls_allowed flag travels on a different socket
        // than the bus frames, so tolerate a short mismatch before the
        // event pipeline disengages.
        if !self.engagement.enabled() {
            self.mismatch_counter = 0;
        }
        if self.engagement.enabled()
            && self
                .hub
                .panda_states
                .data()
                .iter()
                .any(|ps| !ps.controls_allowed && !ps.safety_model.is_ignored())
        {
            self.mismatch_counter += 1;
        }

        self.distance_traveled += cs.v_ego * DT_CTRL;

        cs
    }

    // ─── Phase 3: State transition ──────────────────────────────────

    /// Advance the operator set-speed and the engagement state machine.
    pub(crate) fn state_transition(&mut self, cs: &CarState) {
        self.speed.update_v_cruise(cs, self.engagement.enabled());

        self.current_alert_classes.clear();
        let _ = self.current_alert_classes.push(AlertClass::Permanent);

        let just_engaged = self
            .engagement
            .update(&self.events, &mut self.current_alert_classes);
        if just_engaged {
            self.speed.initialize_v_cruise(cs.v_ego, &cs.button_events);
        }
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Execute one full tick.
    pub fn step(&mut self) {
        let cs = self.data_sample();

        self.update_events(&cs);

        if !self.read_only && self.initialized {
            self.state_transition(&cs);
        }

        let (actuators, lac_log) = self.state_control(&cs);

        self.publish(&cs, &actuators, lac_log);

        self.speed.update_button_timers(&cs.button_events);
    }

    /// The endless paced loop. Never returns; shutdown is by process
    /// termination.
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
            self.rk.monitor_time();
        }
    }
}
