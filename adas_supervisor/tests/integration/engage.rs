//! Integration: cold start and engagement lifecycle.

use adas_common::consts::{DT_CTRL, INIT_TIMEOUT};
use adas_common::events::{AlertClass, EventKind};
use adas_common::messages::EngagementState;

use super::harness::{Rig, default_config, recognized_car};

#[test]
fn cold_start_initializes_on_healthy_telemetry() {
    let mut rig = Rig::new();
    assert!(!rig.sup.initialized());
    rig.tick();
    assert!(rig.sup.initialized());
    // The startup advisory fires exactly once, on the first tick.
    assert!(rig.sup.events().contains(EventKind::Startup));
    rig.tick();
    assert!(!rig.sup.events().contains(EventKind::Startup));
}

#[test]
fn cold_start_without_telemetry_initializes_at_deadline() {
    let mut rig = Rig::new();
    rig.feeding.clear(); // no collaborator ever publishes

    let deadline_ticks = (INIT_TIMEOUT / DT_CTRL) as u64 + 1;
    for _ in 0..deadline_ticks - 1 {
        rig.tick();
        assert!(!rig.sup.initialized(), "initialized early at {}", rig.sup.frame());
        assert!(rig.sup.events().contains(EventKind::ControlsInitializing));
    }
    rig.tick();
    assert!(rig.sup.initialized());
}

#[test]
fn engage_on_button_seeds_cruise_speed() {
    let mut rig = Rig::new();
    rig.engage();
    assert_eq!(rig.sup.engagement().state(), EngagementState::Enabled);
    assert!(rig.sup.engagement().active());
    // 20 m/s = 72 kph, inside [V_CRUISE_MIN, V_CRUISE_MAX].
    assert_eq!(rig.sup.speed().v_cruise_kph, 72.0);
    // The odometer integrates vEgo across the ticks so far.
    let expected = 20.0 * DT_CTRL * rig.sup.frame() as f64;
    assert!((rig.sup.distance_traveled() - expected).abs() < 1e-9);
}

#[test]
fn no_entry_event_blocks_engagement() {
    let mut rig = Rig::new();
    rig.tick();
    // An uncalibrated camera carries NO_ENTRY.
    rig.senders.calibration.send(Default::default()); // Uncalibrated
    rig.kill_channel("liveCalibration");
    rig.tick_with_event(EventKind::ButtonEnable);
    assert_eq!(rig.sup.engagement().state(), EngagementState::Disabled);
    assert!(rig.sup.events().any(AlertClass::NoEntry));
}

#[test]
fn user_cancel_disengages_immediately() {
    let mut rig = Rig::new();
    rig.engage();
    rig.tick_with_event(EventKind::ButtonCancel);
    assert_eq!(rig.sup.engagement().state(), EngagementState::Disabled);
    assert!(!rig.sup.engagement().enabled());
}

#[test]
fn read_only_supervisor_never_transitions() {
    let mut cfg = default_config();
    cfg.passive = true;
    let mut rig = Rig::with(cfg, recognized_car());
    assert!(rig.sup.read_only());
    rig.tick();
    rig.tick_with_event(EventKind::ButtonEnable);
    assert_eq!(rig.sup.engagement().state(), EngagementState::Disabled);
    // Dashcam advisory rides along every tick.
    assert!(rig.sup.events().contains(EventKind::DashcamMode));
}

#[test]
fn unrecognized_car_is_read_only_with_advisory() {
    let rig = Rig::with(default_config(), Default::default());
    assert!(rig.sup.read_only());
}
