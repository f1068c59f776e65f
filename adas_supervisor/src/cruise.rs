//! Cruise set-speed arbitration.
//!
//! Owns the operator target (`v_cruise_kph`), the curvature-derived speed
//! limit, the lead-vehicle safety speed, the road-speed-limit clamp, and
//! the smoothed display/limit set-speed (`max_speed_clu`).
//!
//! CLU ("cluster unit") is the dashboard speed unit — kph in metric mode,
//! mph otherwise. The lead/ego composition deliberately mixes m/s and CLU
//! the way the shipped behavior does; see DESIGN.md.

use adas_common::car::{ButtonEvent, ButtonType, CarState};
use adas_common::consts::{
    CRUISE_LONG_PRESS, CURVE_SPEED_NONE, CURVE_SPEED_PERIOD, MAX_SPEED_SMOOTHING_KP,
    MIN_CURVE_SPEED, TRAJECTORY_SIZE, V_CRUISE_DELTA_KM, V_CRUISE_DELTA_MI, V_CRUISE_ENABLE_MIN,
    V_CRUISE_MAX, V_CRUISE_MIN, cv,
};
use adas_common::math::{gradient, interp, mean};
use adas_common::telemetry::{ModelV2, RadarState};

use crate::config::TuningConfig;

/// Snapshot from the road-speed-limit provider.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RoadLimit {
    pub active: bool,
    /// Enforceable limit [CLU]; 0 when no limit applies.
    pub apply_limit_speed: f64,
    /// Posted limit [CLU], for display.
    pub road_limit_speed: f64,
    /// Distance to the limit zone [m].
    pub left_dist: f64,
    /// Rising edge of the limit becoming enforceable.
    pub first_started: bool,
}

/// Narrow contract to the navigation/road-data provider.
pub trait RoadSpeedLimiter: Send {
    fn max_speed(&mut self, v_ego: f64, is_metric: bool) -> RoadLimit;
}

/// Provider stub for rigs without road data.
#[derive(Debug, Default)]
pub struct NoRoadLimits;

impl RoadSpeedLimiter for NoRoadLimits {
    fn max_speed(&mut self, _v_ego: f64, _is_metric: bool) -> RoadLimit {
        RoadLimit::default()
    }
}

/// Standoff distance subtracted from the radar range [m].
const LEAD_STANDOFF: f64 = 5.0;

/// Closing-speed multiple that opens the lead-clamp window.
const LEAD_RANGE_FACTOR: f64 = 24.0;

/// Closing speed [m/s] below which the lead clamp never engages.
const LEAD_CLOSING_SPEED: f64 = -1.0;

/// Attenuation of the lead deceleration into the display-speed trajectory.
const LEAD_ACCEL_ATTENUATION: f64 = 0.001;

/// Display seed offset on the lead-clamp rising edge [CLU].
const LEAD_SEED_OFFSET: f64 = 3.0;

/// Per-tick cruise arbitration state, preserved across ticks.
#[derive(Debug, Clone)]
pub struct SpeedLimiter {
    /// Operator cruise target [kph]. 255 until first initialization.
    pub v_cruise_kph: f64,
    /// Previous tick's operator target [kph].
    pub v_cruise_kph_last: f64,
    /// Smoothed display/limit set-speed [CLU].
    max_speed_clu: f64,
    /// Curvature-derived speed limit [m/s]; 255 when unconstrained.
    curve_speed_ms: f64,
    /// Lead clamp currently binding.
    limited_lead: bool,
    slowing_down: bool,
    slowing_down_alert: bool,
    slowing_down_sound_alert: bool,
    /// Hold counters for [accel, decel] cruise buttons [ticks].
    button_timers: [u32; 2],
    is_metric: bool,
    slow_on_curves: bool,
    scc_curvature_factor: f64,
    /// m/s → CLU conversion.
    speed_conv_to_clu: f64,
    min_set_speed_clu: f64,
}

impl SpeedLimiter {
    pub fn new(is_metric: bool, tuning: &TuningConfig) -> Self {
        let speed_conv_to_clu = if is_metric {
            cv::MS_TO_KPH
        } else {
            cv::MS_TO_MPH
        };
        let mut limiter = Self {
            v_cruise_kph: 255.0,
            v_cruise_kph_last: 0.0,
            max_speed_clu: 0.0,
            curve_speed_ms: 0.0,
            limited_lead: false,
            slowing_down: false,
            slowing_down_alert: false,
            slowing_down_sound_alert: false,
            button_timers: [0, 0],
            is_metric,
            slow_on_curves: tuning.slow_on_curves,
            scc_curvature_factor: tuning.scc_curvature_factor,
            speed_conv_to_clu,
            min_set_speed_clu: 0.0,
        };
        limiter.min_set_speed_clu = limiter.kph_to_clu(V_CRUISE_MIN);
        limiter
    }

    /// Dashboard-unit value for a kph speed (integer CLU).
    pub fn kph_to_clu(&self, kph: f64) -> f64 {
        (kph * cv::KPH_TO_MS * self.speed_conv_to_clu).round()
    }

    /// Smoothed display/limit set-speed [CLU].
    #[inline]
    pub fn max_speed_clu(&self) -> f64 {
        self.max_speed_clu
    }

    /// Curvature-derived limit [m/s].
    #[inline]
    pub fn curve_speed_ms(&self) -> f64 {
        self.curve_speed_ms
    }

    /// Lead clamp currently binding.
    #[inline]
    pub fn limited_lead(&self) -> bool {
        self.limited_lead
    }

    /// Sticky advisory: the road-limit clamp is pulling the target down.
    #[inline]
    pub fn slowing_down_alert(&self) -> bool {
        self.slowing_down_alert
    }

    /// One-shot chime request on entering the road-limit regime.
    pub fn take_sound_alert(&mut self) -> bool {
        std::mem::take(&mut self.slowing_down_sound_alert)
    }

    // ─── Operator target ────────────────────────────────────────────

    fn timer_slot(button: ButtonType) -> Option<usize> {
        match button {
            ButtonType::AccelCruise => Some(0),
            ButtonType::DecelCruise => Some(1),
            _ => None,
        }
    }

    /// Advance hold counters; press edges arm a timer, release edges clear
    /// it. Runs at the end of every tick.
    pub fn update_button_timers(&mut self, button_events: &[ButtonEvent]) {
        for t in self.button_timers.iter_mut() {
            if *t > 0 {
                *t += 1;
            }
        }
        for b in button_events {
            if let Some(slot) = Self::timer_slot(b.button) {
                self.button_timers[slot] = u32::from(b.pressed);
            }
        }
    }

    /// Apply one tick of operator set-speed input.
    pub fn update_v_cruise(&mut self, cs: &CarState, enabled: bool) {
        self.v_cruise_kph_last = self.v_cruise_kph;

        if cs.adaptive_cruise {
            self.apply_buttons(&cs.button_events, enabled);
            if cs.regen_pressed && enabled {
                // Regen paddle drags the target down toward current speed.
                let v_ego_kph = cs.v_ego * cv::MS_TO_KPH;
                if self.v_cruise_kph > v_ego_kph {
                    self.v_cruise_kph = v_ego_kph.max(V_CRUISE_MIN);
                }
            }
        } else if cs.cruise_state.enabled {
            // Stock PCM owns the set-speed; park ours at the floor.
            self.v_cruise_kph = 30.0;
        }
    }

    fn apply_buttons(&mut self, button_events: &[ButtonEvent], enabled: bool) {
        if !enabled {
            return;
        }

        let mut button: Option<(usize, bool)> = None;
        for b in button_events {
            if let Some(slot) = Self::timer_slot(b.button) {
                if !b.pressed {
                    if self.button_timers[slot] > CRUISE_LONG_PRESS {
                        return; // end of a long press: the hold already acted
                    }
                    button = Some((slot, false));
                    break;
                }
            }
        }
        if button.is_none() {
            for (slot, timer) in self.button_timers.iter().enumerate() {
                if *timer > 0 && timer.is_multiple_of(CRUISE_LONG_PRESS) {
                    button = Some((slot, true));
                    break;
                }
            }
        }
        let Some((slot, long_press)) = button else {
            return;
        };

        let sign = if slot == 0 { 1.0 } else { -1.0 };
        let delta = if long_press {
            if self.is_metric {
                V_CRUISE_DELTA_KM
            } else {
                V_CRUISE_DELTA_MI
            }
        } else if self.is_metric {
            1.0
        } else {
            cv::MPH_TO_KPH
        };

        let off_grid = (self.v_cruise_kph / delta).fract().abs() > 1e-9;
        if long_press && off_grid {
            // Snap onto the delta grid in the commanded direction.
            self.v_cruise_kph = if sign > 0.0 {
                (self.v_cruise_kph / delta).ceil() * delta
            } else {
                (self.v_cruise_kph / delta).floor() * delta
            };
        } else {
            self.v_cruise_kph += sign * delta;
        }
        self.v_cruise_kph =
            ((self.v_cruise_kph * 10.0).round() / 10.0).clamp(V_CRUISE_MIN, V_CRUISE_MAX);
    }

    /// Seed the operator target on engagement.
    pub fn initialize_v_cruise(&mut self, v_ego: f64, button_events: &[ButtonEvent]) {
        // A resume-style press restores the previous target when one exists.
        for b in button_events {
            if b.button == ButtonType::AccelCruise && self.v_cruise_kph_last < 250.0 {
                self.v_cruise_kph = self.v_cruise_kph_last;
                return;
            }
        }
        self.v_cruise_kph = (v_ego * cv::MS_TO_KPH)
            .clamp(V_CRUISE_ENABLE_MIN, V_CRUISE_MAX)
            .round();
    }

    // ─── Curve speed ────────────────────────────────────────────────

    /// Recompute the curvature-derived limit at 5 Hz from the predicted
    /// path: κ = y″ / (1 + y′²)^{3/2} by finite differences, windowed
    /// around the speed-scaled lookahead.
    pub fn cal_curve_speed(&mut self, model: &ModelV2, v_ego: f64, frame: u64) {
        if !frame.is_multiple_of(CURVE_SPEED_PERIOD) {
            return;
        }
        let x = model.position_x.as_slice();
        let y = model.position_y.as_slice();
        if x.len() != TRAJECTORY_SIZE || y.len() != TRAJECTORY_SIZE {
            self.curve_speed_ms = CURVE_SPEED_NONE;
            return;
        }

        let mut dy = [0.0; TRAJECTORY_SIZE];
        let mut d2y = [0.0; TRAJECTORY_SIZE];
        gradient(y, x, &mut dy);
        gradient(&dy, x, &mut d2y);

        let start = interp(
            v_ego,
            &[10.0, 27.0],
            &[10.0, (TRAJECTORY_SIZE - 10) as f64],
        ) as usize;
        let end = (start + 10).min(TRAJECTORY_SIZE);

        let a_y_max = 2.975 - v_ego * 0.0375; // ~1.85 @ 75 mph, ~2.6 @ 25 mph
        let mut v_curvature = [0.0; 10];
        let n = end - start;
        for i in 0..n {
            let curv = d2y[start + i] / (1.0 + dy[start + i] * dy[start + i]).powf(1.5);
            v_curvature[i] = (a_y_max / curv.abs().max(1e-4)).sqrt();
        }
        let model_speed = mean(&v_curvature[..n]) * 0.85 * self.scc_curvature_factor;

        self.curve_speed_ms = if model_speed.is_nan() {
            CURVE_SPEED_NONE
        } else if model_speed < v_ego {
            model_speed.max(MIN_CURVE_SPEED)
        } else {
            CURVE_SPEED_NONE
        };
    }

    // ─── Lead-vehicle safe speed ────────────────────────────────────

    /// Display-speed cap while closing on a slower lead; 0 when no clamp
    /// applies.
    pub fn lead_safe_speed(&self, radar: &RadarState, adaptive_cruise: bool, v_ego: f64) -> f64 {
        if !adaptive_cruise || !radar.lead_one.status {
            return 0.0;
        }
        let lead = radar.lead_one;
        let d = lead.d_rel - LEAD_STANDOFF;
        if lead.v_rel < LEAD_CLOSING_SPEED && d > 0.0 && d < -lead.v_rel * LEAD_RANGE_FACTOR {
            let t = d / lead.v_rel;
            let accel = -(lead.v_rel / t) * self.speed_conv_to_clu * LEAD_ACCEL_ATTENUATION;
            if accel < 0.0 {
                return (v_ego + accel).max(self.min_set_speed_clu);
            }
        }
        0.0
    }

    // ─── Composition ────────────────────────────────────────────────

    /// Arbitrate the tick's allowed set-speed from the operator target,
    /// curve limit, road limit and lead clamp, then smooth it into
    /// `max_speed_clu`.
    pub fn cal_max_speed(
        &mut self,
        frame: u64,
        v_ego: f64,
        model: &ModelV2,
        radar: &RadarState,
        cs: &CarState,
        road: &RoadLimit,
    ) {
        self.cal_curve_speed(model, v_ego, frame);

        let mut max_speed_clu = if self.slow_on_curves && self.curve_speed_ms >= MIN_CURVE_SPEED
        {
            (self.v_cruise_kph * cv::KPH_TO_MS).min(self.curve_speed_ms) * self.speed_conv_to_clu
        } else {
            self.kph_to_clu(self.v_cruise_kph)
        };

        if road.apply_limit_speed >= self.kph_to_clu(30.0) {
            if road.first_started {
                self.max_speed_clu = self.v_cruise_kph;
            }
            max_speed_clu = max_speed_clu.min(road.apply_limit_speed);

            if self.v_cruise_kph > road.apply_limit_speed {
                if !self.slowing_down_alert && !self.slowing_down {
                    self.slowing_down_sound_alert = true;
                    self.slowing_down = true;
                }
                self.slowing_down_alert = true;
            } else {
                self.slowing_down_alert = false;
            }
        } else {
            self.slowing_down_alert = false;
            self.slowing_down = false;
        }

        let lead_speed = self.lead_safe_speed(radar, cs.adaptive_cruise, v_ego);
        if lead_speed >= self.min_set_speed_clu {
            if lead_speed < max_speed_clu {
                max_speed_clu = max_speed_clu.min(lead_speed);
                if !self.limited_lead {
                    // Seed the display from current speed so the readout
                    // glides instead of jumping on the clamp's rising edge.
                    self.max_speed_clu = v_ego + LEAD_SEED_OFFSET;
                    self.limited_lead = true;
                }
            }
        } else {
            self.limited_lead = false;
        }

        self.update_max_speed((max_speed_clu + 0.5).floor(), cs.adaptive_cruise);
    }

    /// Single-pole IIR toward `target`; snaps when cruise is disengaged
    /// from the supervisor's side or the smoother is unseeded.
    fn update_max_speed(&mut self, target: f64, adaptive_cruise: bool) {
        if !adaptive_cruise || self.max_speed_clu <= 0.0 {
            self.max_speed_clu = target;
        } else {
            let error = target - self.max_speed_clu;
            self.max_speed_clu += error * MAX_SPEED_SMOOTHING_KP;
        }
    }
}
