//! Integration: soft-disable window semantics (3 s recovery budget).

use adas_common::consts::SOFT_DISABLE_TICKS;
use adas_common::events::EventKind;
use adas_common::messages::EngagementState;

use super::harness::Rig;

#[test]
fn soft_disable_recovers_inside_the_window() {
    let mut rig = Rig::new();
    rig.engage();

    // 2.99 s of a SOFT_DISABLE condition.
    for tick in 0..SOFT_DISABLE_TICKS - 1 {
        rig.tick_with_event(EventKind::DoorOpen);
        assert_eq!(
            rig.sup.engagement().state(),
            EngagementState::SoftDisabling,
            "tick {tick}"
        );
    }
    // Condition clears: straight back to Enabled, never Disabled.
    rig.tick();
    assert_eq!(rig.sup.engagement().state(), EngagementState::Enabled);
    assert!(rig.sup.engagement().active());
}

#[test]
fn soft_disable_times_out_exactly_at_the_window_end() {
    let mut rig = Rig::new();
    rig.engage();

    rig.tick_with_event(EventKind::DoorOpen); // entry tick, timer armed
    assert_eq!(rig.sup.engagement().state(), EngagementState::SoftDisabling);
    assert_eq!(rig.sup.engagement().soft_disable_timer(), SOFT_DISABLE_TICKS);

    for tick in 1..SOFT_DISABLE_TICKS {
        rig.tick_with_event(EventKind::DoorOpen);
        assert_eq!(
            rig.sup.engagement().state(),
            EngagementState::SoftDisabling,
            "disabled early at tick {tick}"
        );
    }
    rig.tick_with_event(EventKind::DoorOpen);
    assert_eq!(rig.sup.engagement().state(), EngagementState::Disabled);
}

#[test]
fn dead_collaborator_raises_comm_issue_and_soft_disables() {
    let mut rig = Rig::new();
    rig.engage();

    // The lateral planner dies; its 20 Hz channel goes stale after its
    // liveness window and the event pipeline enters the soft-disable path.
    rig.kill_channel("lateralPlan");
    let mut saw_comm_issue = false;
    for _ in 0..120 {
        rig.tick();
        if rig.sup.events().contains(EventKind::CommIssue) {
            saw_comm_issue = true;
            break;
        }
    }
    assert!(saw_comm_issue, "commIssue never raised");
    assert_eq!(rig.sup.engagement().state(), EngagementState::SoftDisabling);

    // The planner comes back before the window expires.
    rig.feeding.push("lateralPlan");
    rig.tick();
    rig.tick();
    assert_eq!(rig.sup.engagement().state(), EngagementState::Enabled);
}
