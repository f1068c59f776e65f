//! Integration: safety cross-checks and the actuator finiteness guard.

use adas_common::car::SafetyModel;
use adas_common::consts::{CONTROLS_MISMATCH_LIMIT, CONTROL_N};
use adas_common::events::EventKind;
use adas_common::messages::EngagementState;
use adas_common::telemetry::PandaState;

use super::harness::Rig;

#[test]
fn nan_from_the_planner_is_clipped_to_zero() {
    let mut rig = Rig::new();
    rig.engage();

    // Poison the lateral plan; the controller output goes non-finite and
    // the guard must clip it before publication.
    let mut plan = Rig::healthy_lat_plan();
    plan.psis.clear();
    plan.curvatures.clear();
    plan.curvature_rates.clear();
    for _ in 0..CONTROL_N {
        let _ = plan.psis.push(f64::NAN);
        let _ = plan.curvatures.push(f64::NAN);
        let _ = plan.curvature_rates.push(f64::NAN);
    }
    rig.lat_plan_override = Some(plan);

    let state_before = rig.sup.engagement().state();
    rig.tick();

    assert!(rig.outs.car_control.update(0));
    let actuators = rig.outs.car_control.data().actuators;
    assert_eq!(actuators.steer, 0.0);
    assert_eq!(actuators.steering_angle_deg, 0.0);
    assert!(actuators.accel.is_finite());
    // The guard never transitions state on its own.
    assert_eq!(rig.sup.engagement().state(), state_before);
}

#[test]
fn panda_controls_disagreement_disengages_after_tolerance() {
    let mut rig = Rig::new();
    rig.engage();

    // The panda stops reporting controlsAllowed while we stay engaged.
    rig.kill_channel("pandaStates");
    rig.senders.panda_states.send(vec![PandaState {
        controls_allowed: false,
        safety_model: SafetyModel::Hyundai,
        safety_param: 0,
        ..PandaState::default()
    }]);

    let mut disabled_at = None;
    for tick in 0..CONTROLS_MISMATCH_LIMIT + 50 {
        rig.tick();
        if rig.sup.engagement().state() == EngagementState::Disabled {
            disabled_at = Some(tick);
            break;
        }
    }
    let disabled_at = disabled_at.expect("controls mismatch never disengaged");
    assert!(
        disabled_at >= CONTROLS_MISMATCH_LIMIT - 2,
        "disengaged too early at {disabled_at}"
    );
    assert!(rig.sup.events().contains(EventKind::ControlsMismatch));
}

#[test]
fn wrong_safety_personality_disengages_immediately() {
    let mut rig = Rig::new();
    rig.engage();

    rig.kill_channel("pandaStates");
    rig.senders.panda_states.send(vec![PandaState {
        controls_allowed: true,
        safety_model: SafetyModel::NoOutput,
        safety_param: 0,
        ..PandaState::default()
    }]);
    rig.tick();
    assert!(rig.sup.events().contains(EventKind::ControlsMismatch));
    assert_eq!(rig.sup.engagement().state(), EngagementState::Disabled);
}

#[test]
fn pcm_cruise_disagreement_raises_event_after_three_seconds() {
    let mut rig = Rig::new();
    rig.tick(); // initialized, never engaged

    rig.car.modify(|cs| cs.cruise_state.enabled = true);
    let mismatch_ticks = (3.0 / adas_common::consts::DT_CTRL) as usize;
    for _ in 0..mismatch_ticks {
        rig.tick();
        assert!(!rig.sup.events().contains(EventKind::CruiseMismatch));
    }
    rig.tick();
    assert!(rig.sup.events().contains(EventKind::CruiseMismatch));
}

#[test]
fn cruise_cancel_follows_pcm_disagreement() {
    let mut rig = Rig::new();
    rig.tick();

    // PCM claims cruise while the supervisor is disengaged → cancel.
    rig.car.modify(|cs| cs.cruise_state.enabled = true);
    rig.tick();
    assert!(rig.outs.car_control.update(0));
    assert!(rig.outs.car_control.data().cruise_control.cancel);

    // PCM cruise off → nothing to cancel.
    rig.car.modify(|cs| cs.cruise_state.enabled = false);
    rig.tick();
    rig.outs.car_control.update(0);
    assert!(!rig.outs.car_control.data().cruise_control.cancel);
}

#[test]
fn can_silence_raises_can_error_and_disengages() {
    let mut rig = Rig::new();
    rig.engage();

    // Two ticks with no bus frames: the blocking read times out, the
    // canError event fires and the engagement drops.
    rig.feed_telemetry();
    rig.sup.step();
    assert!(rig.sup.events().contains(EventKind::CanError));
    assert_eq!(rig.sup.engagement().state(), EngagementState::Disabled);
}
