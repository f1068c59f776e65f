//! Event catalog and per-tick event set.
//!
//! Every condition the supervisor reacts to is an [`EventKind`]. Each kind
//! carries a static set of [`AlertClass`]es that classify which engagement
//! transition the event can trigger and which alert it renders while doing
//! so. The catalog is data, not behavior: the state machine only ever asks
//! "is any event of class X present this tick".
//!
//! The event set is rebuilt from scratch every tick; there is no cross-tick
//! event identity.

use serde::{Deserialize, Serialize};

use crate::alerts::{Alert, AlertSize, AlertStatus, AudibleAlert, Priority, VisualAlert};

/// Maximum simultaneous events per tick.
pub const MAX_EVENTS: usize = 64;

/// Maximum alerts produced per tick.
pub const MAX_ALERTS: usize = 16;

/// Transition class an event can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertClass {
    /// Engagement request.
    Enable,
    /// Engagement granted but actuators held off.
    PreEnable,
    /// Blocks engagement attempts without exiting.
    NoEntry,
    /// Driver warning, no state change.
    Warning,
    /// Driver-commanded disengagement.
    UserDisable,
    /// Degraded-mode disengagement with a 3 s recovery window.
    SoftDisable,
    /// Disengage this tick.
    ImmediateDisable,
    /// Background advisory, always attached.
    Permanent,
}

/// Enumerated catalog of supervisor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    // Lifecycle
    ControlsInitializing,
    Startup,
    StartupNoControl,
    StartupNoCar,
    DashcamMode,
    JoystickDebug,
    CarUnrecognized,
    CommunityFeatureDisallowed,

    // Engagement requests and driver overrides (from the vehicle interface)
    ButtonEnable,
    PcmEnable,
    ButtonCancel,
    PcmDisable,
    PedalPressed,
    BrakeHold,
    WrongGear,
    DoorOpen,
    SeatbeltNotLatched,
    EspDisabled,

    // Hardware / resources
    LowBattery,
    Overheat,
    OutOfSpace,
    LowMemory,
    FanMalfunction,

    // Calibration
    CalibrationIncomplete,
    CalibrationInvalid,

    // Lane change
    PreLaneChangeLeft,
    PreLaneChangeRight,
    LaneChangeBlocked,
    LaneChange,

    // Bus & comms
    CanError,
    RelayMalfunction,
    UsbError,
    CommIssue,
    ControlsMismatch,
    ProcessNotRunning,

    // Perception / localization / planner
    RadarFault,
    VehicleModelInvalid,
    PlannerError,
    SensorDataInvalid,
    PosenetInvalid,
    DeviceFalling,
    ModeldLagging,
    LocalizerMalfunction,
    CameraMalfunction,
    RoadCameraError,
    WideRoadCameraError,
    DriverCameraError,

    // Cruise arbitration
    CruiseMismatch,
    SlowingDownSpeed,
    SlowingDownSpeedSound,

    // Driver warnings
    Fcw,
    Ldw,
    SteerSaturated,
}

type Entry = (AlertClass, Alert);

macro_rules! entries {
    ($($class:ident => $alert:expr),+ $(,)?) => {
        const { &[$((AlertClass::$class, $alert)),+] }
    };
}

/// Static `(class, alert)` table for an event kind.
pub fn catalog(kind: EventKind) -> &'static [Entry] {
    use EventKind::*;
    match kind {
        ControlsInitializing => entries![
            NoEntry => Alert::no_entry("System Initializing"),
        ],
        Startup => entries![
            Permanent => Alert::new(
                "Be ready to take over at any time",
                "Always keep hands on wheel and eyes on road",
                AlertStatus::Normal, AlertSize::Mid, Priority::LowLowest,
                VisualAlert::None, AudibleAlert::None, 10.0),
        ],
        StartupNoControl => entries![
            Permanent => Alert::new(
                "Dashcam mode",
                "Always keep hands on wheel and eyes on road",
                AlertStatus::Normal, AlertSize::Mid, Priority::LowLowest,
                VisualAlert::None, AudibleAlert::None, 10.0),
        ],
        StartupNoCar => entries![
            Permanent => Alert::new(
                "Dashcam mode for unsupported car",
                "Always keep hands on wheel and eyes on road",
                AlertStatus::Normal, AlertSize::Mid, Priority::LowLowest,
                VisualAlert::None, AudibleAlert::None, 10.0),
        ],
        DashcamMode => entries![
            Permanent => Alert::permanent("Dashcam Mode", ""),
        ],
        JoystickDebug => entries![
            Permanent => Alert::permanent("Joystick Mode", ""),
        ],
        CarUnrecognized => entries![
            Permanent => Alert::permanent("Dashcam Mode", "Car Unrecognized"),
        ],
        CommunityFeatureDisallowed => entries![
            Permanent => Alert::permanent("Community Feature Detected",
                                          "Enable Community Features in Settings"),
        ],

        ButtonEnable | PcmEnable => entries![
            Enable => Alert::new(
                "", "",
                AlertStatus::Normal, AlertSize::None, Priority::Mid,
                VisualAlert::None, AudibleAlert::Engage, 0.2),
        ],
        ButtonCancel => entries![
            UserDisable => Alert::user_disable("", ""),
        ],
        PcmDisable => entries![
            UserDisable => Alert::user_disable("", ""),
        ],
        PedalPressed => entries![
            UserDisable => Alert::user_disable("", ""),
            NoEntry => Alert::no_entry("Pedal Pressed"),
        ],
        BrakeHold => entries![
            PreEnable => Alert::new(
                "Brake Hold Active", "",
                AlertStatus::Normal, AlertSize::Small, Priority::Low,
                VisualAlert::None, AudibleAlert::None, 0.2),
            NoEntry => Alert::no_entry("Brake Hold Active"),
        ],
        WrongGear => entries![
            SoftDisable => Alert::soft_disable("Gear not D"),
            NoEntry => Alert::no_entry("Gear not D"),
        ],
        DoorOpen => entries![
            SoftDisable => Alert::soft_disable("Door Open"),
            NoEntry => Alert::no_entry("Door Open"),
        ],
        SeatbeltNotLatched => entries![
            SoftDisable => Alert::soft_disable("Seatbelt Unlatched"),
            NoEntry => Alert::no_entry("Seatbelt Unlatched"),
        ],
        EspDisabled => entries![
            SoftDisable => Alert::soft_disable("ESP Off"),
            NoEntry => Alert::no_entry("ESP Off"),
        ],

        LowBattery => entries![
            SoftDisable => Alert::soft_disable("Low Battery"),
            NoEntry => Alert::no_entry("Low Battery"),
        ],
        Overheat => entries![
            SoftDisable => Alert::soft_disable("System Overheated"),
            NoEntry => Alert::no_entry("System Overheated"),
        ],
        OutOfSpace => entries![
            Permanent => Alert::permanent("Out of Storage", ""),
            NoEntry => Alert::no_entry("Out of Storage"),
        ],
        LowMemory => entries![
            SoftDisable => Alert::soft_disable("Low Memory"),
            Permanent => Alert::permanent("Low Memory", "Reboot your Device"),
            NoEntry => Alert::no_entry("Low Memory"),
        ],
        FanMalfunction => entries![
            Permanent => Alert::permanent("Fan Malfunction", "Contact Support"),
        ],

        CalibrationIncomplete => entries![
            Permanent => Alert::permanent("Calibration in Progress", "Drive Above 15 mph"),
            SoftDisable => Alert::soft_disable("Calibration in Progress"),
            NoEntry => Alert::no_entry("Calibration in Progress"),
        ],
        CalibrationInvalid => entries![
            Permanent => Alert::permanent("Calibration Invalid", "Remount Device and Recalibrate"),
            SoftDisable => Alert::soft_disable("Calibration Invalid"),
            NoEntry => Alert::no_entry("Calibration Invalid"),
        ],

        PreLaneChangeLeft => entries![
            Warning => Alert::warning(
                "Steer Left to Start Lane Change",
                "Monitor Other Vehicles",
                VisualAlert::None, AudibleAlert::None, 0.1),
        ],
        PreLaneChangeRight => entries![
            Warning => Alert::warning(
                "Steer Right to Start Lane Change",
                "Monitor Other Vehicles",
                VisualAlert::None, AudibleAlert::None, 0.1),
        ],
        LaneChangeBlocked => entries![
            Warning => Alert::warning(
                "Car Detected in Blindspot",
                "Monitor Other Vehicles",
                VisualAlert::None, AudibleAlert::Prompt, 0.1),
        ],
        LaneChange => entries![
            Warning => Alert::warning(
                "Changing Lanes",
                "Monitor Other Vehicles",
                VisualAlert::None, AudibleAlert::None, 0.1),
        ],

        CanError => entries![
            ImmediateDisable => Alert::immediate_disable("CAN Error: Check Connections"),
            Permanent => Alert::permanent("CAN Error: Check Connections", ""),
            NoEntry => Alert::no_entry("CAN Error: Check Connections"),
        ],
        RelayMalfunction => entries![
            ImmediateDisable => Alert::immediate_disable("Harness Malfunction"),
            Permanent => Alert::permanent("Harness Malfunction", "Check Hardware"),
            NoEntry => Alert::no_entry("Harness Malfunction"),
        ],
        UsbError => entries![
            SoftDisable => Alert::soft_disable("USB Error: Check Connections"),
            Permanent => Alert::permanent("USB Error: Check Connections", ""),
            NoEntry => Alert::no_entry("USB Error: Check Connections"),
        ],
        CommIssue => entries![
            SoftDisable => Alert::soft_disable("Communication Issue Between Processes"),
            NoEntry => Alert::no_entry("Communication Issue Between Processes"),
        ],
        ControlsMismatch => entries![
            ImmediateDisable => Alert::immediate_disable("Controls Mismatch"),
        ],
        ProcessNotRunning => entries![
            NoEntry => Alert::no_entry("System Malfunction: Reboot Your Device"),
        ],

        RadarFault => entries![
            SoftDisable => Alert::soft_disable("Radar Error: Restart the Car"),
            NoEntry => Alert::no_entry("Radar Error: Restart the Car"),
        ],
        VehicleModelInvalid => entries![
            SoftDisable => Alert::soft_disable("Vehicle Parameter Identification Failed"),
            NoEntry => Alert::no_entry("Vehicle Parameter Identification Failed"),
        ],
        PlannerError => entries![
            ImmediateDisable => Alert::immediate_disable("Planner Solution Error"),
            NoEntry => Alert::no_entry("Planner Solution Error"),
        ],
        SensorDataInvalid => entries![
            Permanent => Alert::permanent("No Data from Device Sensors", "Reboot your Device"),
            NoEntry => Alert::no_entry("No Data from Device Sensors"),
        ],
        PosenetInvalid => entries![
            SoftDisable => Alert::soft_disable("Model Output Uncertain"),
            NoEntry => Alert::no_entry("Model Output Uncertain"),
        ],
        DeviceFalling => entries![
            SoftDisable => Alert::soft_disable("Device Fell Off Mount"),
            NoEntry => Alert::no_entry("Device Fell Off Mount"),
        ],
        ModeldLagging => entries![
            SoftDisable => Alert::soft_disable("Driving Model Lagging"),
            NoEntry => Alert::no_entry("Driving Model Lagging"),
        ],
        LocalizerMalfunction => entries![
            SoftDisable => Alert::soft_disable("Localizer Malfunction"),
            NoEntry => Alert::no_entry("Localizer Malfunction"),
        ],
        CameraMalfunction => entries![
            SoftDisable => Alert::soft_disable("Camera Malfunction"),
            Permanent => Alert::permanent("Camera Malfunction", "Contact Support"),
        ],
        RoadCameraError => entries![
            Permanent => Alert::permanent("Road Camera Error", ""),
        ],
        WideRoadCameraError => entries![
            Permanent => Alert::permanent("Wide Road Camera Error", ""),
        ],
        DriverCameraError => entries![
            Permanent => Alert::permanent("Driver Camera Error", ""),
        ],

        CruiseMismatch => entries![
            ImmediateDisable => Alert::immediate_disable("Cruise Is Off"),
        ],
        SlowingDownSpeed => entries![
            Permanent => Alert::new(
                "Slowing down for speed limit", "",
                AlertStatus::Normal, AlertSize::Small, Priority::Low,
                VisualAlert::None, AudibleAlert::None, 0.1),
        ],
        SlowingDownSpeedSound => entries![
            Permanent => Alert::new(
                "Slowing down for speed limit", "",
                AlertStatus::Normal, AlertSize::Small, Priority::Low,
                VisualAlert::None, AudibleAlert::SlowingDown, 2.0),
        ],

        Fcw => entries![
            Warning => Alert::new(
                "BRAKE!", "Risk of Collision",
                AlertStatus::Critical, AlertSize::Full, Priority::Highest,
                VisualAlert::Fcw, AudibleAlert::WarningImmediate, 2.0),
        ],
        // Rendered regardless of engagement, so it rides the PERMANENT class.
        Ldw => entries![
            Permanent => Alert::new(
                "Lane Departure Detected", "",
                AlertStatus::UserPrompt, AlertSize::Mid, Priority::Low,
                VisualAlert::Ldw, AudibleAlert::Prompt, 3.0),
        ],
        SteerSaturated => entries![
            Warning => Alert::warning(
                "Take Control", "Turn Exceeds Steering Limit",
                VisualAlert::SteerRequired, AudibleAlert::PromptRepeat, 1.0),
        ],
    }
}

/// Per-tick set of active events, rebuilt from scratch each tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSet {
    events: heapless::Vec<EventKind, MAX_EVENTS>,
}

impl EventSet {
    pub const fn new() -> Self {
        Self {
            events: heapless::Vec::new(),
        }
    }

    /// Drop all events. Called at the top of every tick.
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Add a single event; duplicates and overflow are ignored.
    #[inline]
    pub fn add(&mut self, kind: EventKind) {
        if !self.events.contains(&kind) {
            let _ = self.events.push(kind);
        }
    }

    /// Structural passthrough of events attached to an inbound message.
    pub fn add_from_msg(&mut self, events: &[EventKind]) {
        for &e in events {
            self.add(e);
        }
    }

    #[inline]
    pub fn contains(&self, kind: EventKind) -> bool {
        self.events.contains(&kind)
    }

    /// True when any active event carries the given class.
    pub fn any(&self, class: AlertClass) -> bool {
        self.events
            .iter()
            .any(|&e| catalog(e).iter().any(|&(c, _)| c == class))
    }

    /// Active event kinds, in insertion order.
    #[inline]
    pub fn names(&self) -> &[EventKind] {
        &self.events
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Alerts for every active event whose class is in `classes`, tagged
    /// with the class that produced them (the alert manager clears by class).
    pub fn create_alerts(
        &self,
        classes: &[AlertClass],
    ) -> heapless::Vec<(AlertClass, Alert), MAX_ALERTS> {
        let mut alerts = heapless::Vec::new();
        for &e in &self.events {
            for &(class, alert) in catalog(e) {
                if classes.contains(&class) {
                    let _ = alerts.push((class, alert));
                }
            }
        }
        alerts
    }
}
