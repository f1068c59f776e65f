//! Outbound publications.
//!
//! The supervisor owns the producer handle of every outbound channel; the
//! bus adapter, loggers and UI attach consumers via [`Channel::subscribe`].

use adas_common::car::{CanFrame, CarParams, CarState};
use adas_common::control::CarControl;
use adas_common::messages::{CarEventsMsg, ControlsState};

use crate::hub::feed::{Channel, Feed, channel};

/// One tick's batch of produced bus frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendCan {
    pub frames: Vec<CanFrame>,
    /// Mirror of `CarState::can_valid` at send time.
    pub valid: bool,
}

/// Consumers never liveness-check the supervisor at less than 1 Hz.
const OUTBOUND_STALE_TICKS: u64 = 100;

/// All outbound channels of the supervisor.
pub struct Publishers {
    pub sendcan: Channel<SendCan>,
    pub controls_state: Channel<ControlsState>,
    pub car_state: Channel<CarState>,
    pub car_control: Channel<CarControl>,
    pub car_events: Channel<CarEventsMsg>,
    pub car_params: Channel<CarParams>,
}

impl Publishers {
    pub fn new() -> Self {
        // The consumer halves created here are dropped; real consumers
        // attach later via subscribe(), tests likewise.
        let (sendcan, _) = channel(OUTBOUND_STALE_TICKS);
        let (controls_state, _) = channel(OUTBOUND_STALE_TICKS);
        let (car_state, _) = channel(OUTBOUND_STALE_TICKS);
        let (car_control, _) = channel(OUTBOUND_STALE_TICKS);
        let (car_events, _) = channel(OUTBOUND_STALE_TICKS);
        let (car_params, _) = channel(OUTBOUND_STALE_TICKS);
        Self {
            sendcan,
            controls_state,
            car_state,
            car_control,
            car_events,
            car_params,
        }
    }

    /// Attach a consumer to every outbound channel (test harness helper).
    pub fn subscribe_all(&self) -> Outlets {
        Outlets {
            sendcan: self.sendcan.subscribe(OUTBOUND_STALE_TICKS),
            controls_state: self.controls_state.subscribe(OUTBOUND_STALE_TICKS),
            car_state: self.car_state.subscribe(OUTBOUND_STALE_TICKS),
            car_control: self.car_control.subscribe(OUTBOUND_STALE_TICKS),
            car_events: self.car_events.subscribe(OUTBOUND_STALE_TICKS),
            car_params: self.car_params.subscribe(OUTBOUND_STALE_TICKS),
        }
    }
}

impl Default for Publishers {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer bundle over all outbound channels.
pub struct Outlets {
    pub sendcan: Feed<SendCan>,
    pub controls_state: Feed<ControlsState>,
    pub car_state: Feed<CarState>,
    pub car_control: Feed<CarControl>,
    pub car_events: Feed<CarEventsMsg>,
    pub car_params: Feed<CarParams>,
}
