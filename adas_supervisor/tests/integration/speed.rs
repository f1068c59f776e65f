//! Integration: curve-speed clamp and lead-vehicle clamp through full ticks.

use adas_common::consts::TRAJECTORY_SIZE;
use adas_common::telemetry::{LeadData, ModelV2, RadarState};

use super::harness::{Rig, default_config, recognized_car};

fn circle_model(radius: f64) -> ModelV2 {
    let mut m = ModelV2::default();
    for i in 0..TRAJECTORY_SIZE {
        let x = i as f64;
        let _ = m.position_x.push(x);
        let _ = m.position_y.push(radius - (radius * radius - x * x).sqrt());
    }
    m
}

fn closing_lead() -> RadarState {
    RadarState {
        lead_one: LeadData {
            status: true,
            d_rel: 30.0,
            v_rel: -3.0,
        },
        ..RadarState::default()
    }
}

#[test]
fn curve_clamp_converges_toward_curve_speed() {
    let mut cfg = default_config();
    cfg.tuning.scc_curvature_factor = 1.0;
    let mut rig = Rig::with(cfg, recognized_car());
    rig.engage();

    // Constant-curvature arc, κ = 0.02 1/m at 20 m/s.
    rig.model_override = Some(circle_model(50.0));
    rig.tick_n(25); // crosses a 20-tick curve-speed recompute boundary

    let curve = rig.sup.speed().curve_speed_ms();
    assert!(
        (curve - 8.965).abs() < 0.15,
        "curve speed {curve} not near 8.97 m/s"
    );

    // The smoothed display speed decays toward the curve limit in CLU.
    let target_clu = curve * 3.6;
    let before = rig.sup.speed().max_speed_clu();
    rig.tick_n(1_000);
    let after = rig.sup.speed().max_speed_clu();
    assert!(
        (after - target_clu).abs() < (before - target_clu).abs(),
        "display speed did not approach the curve limit"
    );
    assert!((after - target_clu).abs() < 4.0, "after {after}");
}

#[test]
fn lead_clamp_seeds_display_speed_on_rising_edge() {
    let mut rig = Rig::new();
    rig.engage();
    rig.tick(); // settle

    rig.radar_override = Some(closing_lead());
    rig.tick();
    assert!(rig.sup.speed().limited_lead());
    let display = rig.sup.speed().max_speed_clu();
    assert!(
        (display - 25.0).abs() < 0.2,
        "display speed {display} should snap near vEgo + 3"
    );

    // Lead drops away: the clamp releases.
    rig.radar_override = None;
    rig.tick();
    assert!(!rig.sup.speed().limited_lead());
}

#[test]
fn lead_clamp_keeps_pulling_display_toward_safe_speed() {
    let mut rig = Rig::new();
    rig.engage();
    rig.radar_override = Some(closing_lead());
    rig.tick();
    let seeded = rig.sup.speed().max_speed_clu();
    rig.tick_n(200);
    let settled = rig.sup.speed().max_speed_clu();
    // Safe speed floors at 30 CLU; the display converges up toward it
    // from the vEgo + 3 seed.
    assert!(settled > seeded);
    assert!(settled <= 30.5, "settled {settled}");
}
