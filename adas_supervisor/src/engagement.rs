//! Engagement finite-state machine.
//!
//! Disabled → (PreEnabled →) Enabled ↔ SoftDisabling → Disabled, driven
//! purely by the transition classes present in the tick's event set.
//! Priority within a tick: USER_DISABLE, then IMMEDIATE_DISABLE, then the
//! state-specific rules.
//!
//! Invariants:
//! - `enabled ⇔ state ∈ {PreEnabled, Enabled, SoftDisabling}`
//! - `active ⇔ state ∈ {Enabled, SoftDisabling}`
//! - `soft_disable_timer` is reset to 3 s worth of ticks on entering
//!   SoftDisabling and decremented once per tick, floored at zero.

use adas_common::consts::SOFT_DISABLE_TICKS;
use adas_common::events::{AlertClass, EventSet};
use adas_common::messages::EngagementState;

/// Alert classes attached during one transition evaluation.
pub type AlertClasses = heapless::Vec<AlertClass, 8>;

/// Engagement state, preserved across ticks.
#[derive(Debug, Clone)]
pub struct Engagement {
    state: EngagementState,
    enabled: bool,
    active: bool,
    soft_disable_timer: u32,
}

impl Default for Engagement {
    fn default() -> Self {
        Self::new()
    }
}

impl Engagement {
    pub const fn new() -> Self {
        Self {
            state: EngagementState::Disabled,
            enabled: false,
            active: false,
            soft_disable_timer: 0,
        }
    }

    #[inline]
    pub const fn state(&self) -> EngagementState {
        self.state
    }

    /// Engagement granted (HUD and interface gating).
    #[inline]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Actuators live.
    #[inline]
    pub const fn active(&self) -> bool {
        self.active
    }

    /// Remaining soft-disable window [ticks].
    #[inline]
    pub const fn soft_disable_timer(&self) -> u32 {
        self.soft_disable_timer
    }

    /// Evaluate one tick's transition. Appends the alert classes the tick
    /// must render to `classes` and returns true when the machine left
    /// Disabled this tick (the caller then seeds the cruise set-speed).
    pub fn update(&mut self, events: &EventSet, classes: &mut AlertClasses) -> bool {
        use EngagementState::*;

        // Timer decrements every tick; entering SoftDisabling rearms it.
        self.soft_disable_timer = self.soft_disable_timer.saturating_sub(1);

        let mut just_engaged = false;

        if self.state != Disabled {
            if events.any(AlertClass::UserDisable) {
                self.state = Disabled;
                let _ = classes.push(AlertClass::UserDisable);
            } else if events.any(AlertClass::ImmediateDisable) {
                self.state = Disabled;
                let _ = classes.push(AlertClass::ImmediateDisable);
            } else {
                match self.state {
                    Enabled => {
                        if events.any(AlertClass::SoftDisable) {
                            self.state = SoftDisabling;
                            self.soft_disable_timer = SOFT_DISABLE_TICKS;
                            let _ = classes.push(AlertClass::SoftDisable);
                        }
                    }
                    SoftDisabling => {
                        if !events.any(AlertClass::SoftDisable) {
                            // Condition cleared inside the window.
                            self.state = Enabled;
                        } else if self.soft_disable_timer > 0 {
                            let _ = classes.push(AlertClass::SoftDisable);
                        } else {
                            self.state = Disabled;
                        }
                    }
                    PreEnabled => {
                        if !events.any(AlertClass::PreEnable) {
                            self.state = Enabled;
                        } else {
                            let _ = classes.push(AlertClass::PreEnable);
                        }
                    }
                    Disabled => unreachable!(),
                }
            }
        } else if events.any(AlertClass::Enable) {
            if events.any(AlertClass::NoEntry) {
                let _ = classes.push(AlertClass::NoEntry);
            } else {
                self.state = if events.any(AlertClass::PreEnable) {
                    PreEnabled
                } else {
                    Enabled
                };
                let _ = classes.push(AlertClass::Enable);
                just_engaged = true;
            }
        }

        self.active = matches!(self.state, Enabled | SoftDisabling);
        if self.active {
            let _ = classes.push(AlertClass::Warning);
        }
        self.enabled = self.active || self.state == PreEnabled;

        just_engaged
    }
}
