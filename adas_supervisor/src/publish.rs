//! Per-tick publication.
//!
//! Builds the `CarControl` record (actuators + HUD + cruise-cancel), runs
//! the lane-departure-warning decision, feeds the alert manager, pushes the
//! frame batch to the bus adapter, and emits `ControlsState`/`CarState`
//! every tick plus the periodic `CarEvents`/`CarParams`.

use adas_common::car::CarState;
use adas_common::consts::{
    BLINKER_COOLDOWN_TIME, CAR_EVENTS_PERIOD, CAR_PARAMS_PERIOD, DT_CTRL,
    LANE_DEPARTURE_THRESHOLD, LANE_EDGE_OFFSET, LDW_MIN_SPEED, WIDE_CAMERA_OFFSET, cv,
};
use adas_common::control::{Actuators, CarControl};
use adas_common::events::{AlertClass, EventKind};
use adas_common::messages::{CarEventsMsg, ControlsState, EngagementState, LateralControlState};
use adas_common::telemetry::CalStatus;

use crate::hub::SendCan;
use crate::supervisor::Supervisor;

impl Supervisor {
    /// Phase 5: publish the tick's outputs and retain the emitted
    /// `CarControl` as next tick's feedback input.
    pub(crate) fn publish(
        &mut self,
        cs: &CarState,
        actuators: &Actuators,
        lac_log: LateralControlState,
    ) {
        let mut cc = CarControl {
            enabled: self.engagement.enabled(),
            active: self.engagement.active(),
            actuators: *actuators,
            ..CarControl::default()
        };

        let orientation = &self.hub.location.data().orientation_ned;
        if orientation.len() > 2 {
            cc.roll = orientation[0];
            cc.pitch = orientation[1];
        }

        cc.cruise_control.cancel =
            cs.cruise_state.enabled && (!self.engagement.enabled() || !self.cp.pcm_cruise);
        if self.cfg.joystick_mode {
            let cancel_pressed = self
                .hub
                .joystick
                .as_ref()
                .filter(|j| j.received())
                .and_then(|j| j.data().buttons.first().copied())
                .unwrap_or(false);
            if cancel_pressed {
                cc.cruise_control.cancel = true;
            }
        }

        cc.hud_control.set_speed = self.speed.v_cruise_kph * cv::KPH_TO_MS;
        cc.hud_control.speed_visible = self.engagement.enabled();
        cc.hud_control.lanes_visible = self.engagement.enabled();
        cc.hud_control.lead_visible = self.hub.long_plan.data().has_lead;
        cc.hud_control.left_lane_visible = true;
        cc.hud_control.right_lane_visible = true;

        self.update_lane_departure(cs, &mut cc);

        // Alert arbitration: warnings clear the moment the tick stops
        // attaching the WARNING class (i.e. on disengagement).
        let clear_class = if self.current_alert_classes.contains(&AlertClass::Warning) {
            None
        } else {
            Some(AlertClass::Warning)
        };
        let alerts = self.events.create_alerts(&self.current_alert_classes);
        self.am.add_many(self.frame, &alerts);
        self.am.process_alerts(self.frame, clear_class);
        cc.hud_control.visual_alert = self.am.visual_alert();

        if !self.read_only && self.initialized {
            let frames = self.car.apply(&cc);
            self.pubs.sendcan.send(SendCan {
                frames,
                valid: cs.can_valid,
            });
        }

        let force_decel = self.hub.driver_monitoring.data().awareness_status < 0.0
            || self.engagement.state() == EngagementState::SoftDisabling;

        // Offset-corrected steering angle and the curvature it implies.
        let live = self.hub.live_params.data();
        let angle_steers = cs.steering_angle_deg - live.angle_offset_average_deg;
        let curvature = -self.vm.calc_curvature(angle_steers * cv::DEG_TO_RAD, cs.v_ego);

        // Road-limit provider + max-speed arbitration for this tick.
        let road = self.road_limiter.max_speed(cs.v_ego, self.cfg.is_metric);
        {
            let model = self.hub.model.data();
            let radar = self.hub.radar.data();
            self.speed
                .cal_max_speed(self.frame, cs.v_ego, model, radar, cs, &road);
        }

        let controls_state = ControlsState {
            alert_text1: self.am.text1(),
            alert_text2: self.am.text2(),
            alert_status: self.am.status(),
            alert_size: self.am.size(),
            alert_blinking_rate: self.am.blink_rate(),
            alert_sound: self.am.audible_alert(),
            visual_alert: self.am.visual_alert(),
            enabled: self.engagement.enabled(),
            active: self.engagement.active(),
            state: self.engagement.state(),
            engageable: !self.events.any(AlertClass::NoEntry),
            long_control_state: self.loc.state,
            v_pid: self.loc.v_pid,
            v_cruise: if self.cp.supervisor_long_control {
                self.speed.max_speed_clu()
            } else {
                self.speed.v_cruise_kph
            },
            up_accel_cmd: self.loc.p,
            ui_accel_cmd: self.loc.i,
            uf_accel_cmd: self.loc.f,
            force_decel,
            curvature,
            angle_steers,
            steer_ratio: self.vm.steer_ratio(),
            steer_actuator_delay: self.cfg.tuning.steer_actuator_delay,
            lateral_control_state: lac_log,
            scc_gas_factor: self.cfg.tuning.scc_gas_factor,
            scc_brake_factor: self.cfg.tuning.scc_brake_factor,
            scc_curvature_factor: self.cfg.tuning.scc_curvature_factor,
            road_limit_speed_active: road.active,
            road_limit_speed: road.road_limit_speed,
            road_limit_speed_left_dist: road.left_dist,
            cum_lag_ms: -self.rk.remaining() * 1000.0,
            can_error_counter: self.can_error_counter,
        };
        self.pubs
            .controls_state
            .send_with_valid(controls_state, cs.can_valid);

        // carState, with the full per-tick event set attached.
        let mut cs_out = cs.clone();
        cs_out.events.clear();
        let _ = cs_out.events.extend_from_slice(self.events.names());
        self.pubs.car_state.send_with_valid(cs_out, cs.can_valid);

        // carEvents: on change, and at least once per second.
        let names = self.events.names();
        if self.frame.is_multiple_of(CAR_EVENTS_PERIOD) || names != &self.events_prev[..] {
            let mut msg = CarEventsMsg::default();
            let _ = msg.events.extend_from_slice(names);
            self.pubs.car_events.send(msg);
        }
        self.events_prev.clear();
        let _ = self.events_prev.extend_from_slice(names);

        // carParams: sparse periodic snapshot.
        if self.frame.is_multiple_of(CAR_PARAMS_PERIOD) {
            self.pubs.car_params.send(self.cp.clone());
        }

        self.pubs.car_control.send_with_valid(cc.clone(), cs.can_valid);

        // Feedback input to the vehicle interface on the next tick.
        self.cc_prev = cc;
    }

    /// Lane-departure warning: armed only while disengaged at speed with a
    /// calibrated camera and no recent blinker; fires per side when the
    /// model predicts a lane change toward a close lane line.
    fn update_lane_departure(&mut self, cs: &CarState, cc: &mut CarControl) {
        let recent_blinker =
            (self.frame - self.last_blinker_frame) as f64 * DT_CTRL < BLINKER_COOLDOWN_TIME;
        let ldw_allowed = self.cfg.is_ldw_enabled
            && cs.v_ego > LDW_MIN_SPEED
            && !recent_blinker
            && !self.engagement.active()
            && self.hub.calibration.data().cal_status == CalStatus::Calibrated;

        if ldw_allowed {
            let model = self.hub.model.data();
            let plan = self.hub.lat_plan.data();
            let left_lane_visible = plan.l_prob > 0.5;
            let right_lane_visible = plan.r_prob > 0.5;
            let l_lane_change_prob = model.meta.desire_prediction[0];
            let r_lane_change_prob = model.meta.desire_prediction[1];

            let camera_offset = if self.cfg.wide_camera {
                self.cfg.tuning.camera_offset + WIDE_CAMERA_OFFSET
            } else {
                self.cfg.tuning.camera_offset
            };
            let l_lane_close =
                left_lane_visible && model.lane_lines[1].y0 > -(LANE_EDGE_OFFSET + camera_offset);
            let r_lane_close =
                right_lane_visible && model.lane_lines[2].y0 < (LANE_EDGE_OFFSET - camera_offset);

            cc.hud_control.left_lane_depart =
                l_lane_change_prob > LANE_DEPARTURE_THRESHOLD && l_lane_close;
            cc.hud_control.right_lane_depart =
                r_lane_change_prob > LANE_DEPARTURE_THRESHOLD && r_lane_close;
        }

        if cc.hud_control.left_lane_depart || cc.hud_control.right_lane_depart {
            self.events.add(EventKind::Ldw);
        }
    }
}
