//! Alert manager.
//!
//! Collects the alerts produced by one tick's events, keeps them alive for
//! their declared duration, and selects a single visual/audible alert to
//! publish: highest priority wins, freshest breaks ties.

use adas_common::alerts::{Alert, AlertSize, AlertStatus, AudibleAlert, VisualAlert};
use adas_common::events::AlertClass;

/// Slots: one live alert per transition class is enough — within a class
/// the newest producer wins.
const MAX_ACTIVE: usize = 8;

#[derive(Debug, Clone, Copy)]
struct ActiveAlert {
    class: AlertClass,
    alert: Alert,
    start_frame: u64,
    end_frame: u64,
}

/// Cross-tick alert selection state.
#[derive(Debug, Default)]
pub struct AlertManager {
    active: heapless::Vec<ActiveAlert, MAX_ACTIVE>,
    current: Option<Alert>,
}

impl AlertManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh the tick's alerts.
    pub fn add_many(&mut self, frame: u64, alerts: &[(AlertClass, Alert)]) {
        for &(class, alert) in alerts {
            let end_frame = frame + u64::from(alert.duration);
            if let Some(slot) = self.active.iter_mut().find(|a| a.class == class) {
                if slot.alert != alert {
                    slot.start_frame = frame;
                }
                slot.alert = alert;
                slot.end_frame = end_frame;
            } else {
                let _ = self.active.push(ActiveAlert {
                    class,
                    alert,
                    start_frame: frame,
                    end_frame,
                });
            }
        }
    }

    /// Cull expired alerts (and the cleared class, if any), then select the
    /// current alert by `(priority, start_frame)`.
    pub fn process_alerts(&mut self, frame: u64, clear_class: Option<AlertClass>) {
        self.active
            .retain(|a| a.end_frame > frame && Some(a.class) != clear_class);
        self.current = self
            .active
            .iter()
            .max_by_key(|a| (a.alert.priority, a.start_frame))
            .map(|a| a.alert);
    }

    /// Currently selected alert, if any.
    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref()
    }

    pub fn text1(&self) -> &'static str {
        self.current.map_or("", |a| a.text1)
    }

    pub fn text2(&self) -> &'static str {
        self.current.map_or("", |a| a.text2)
    }

    pub fn status(&self) -> AlertStatus {
        self.current.map_or(AlertStatus::Normal, |a| a.status)
    }

    pub fn size(&self) -> AlertSize {
        self.current.map_or(AlertSize::None, |a| a.size)
    }

    pub fn blink_rate(&self) -> f64 {
        self.current.map_or(0.0, |a| a.blink_rate)
    }

    pub fn visual_alert(&self) -> VisualAlert {
        self.current.map_or(VisualAlert::None, |a| a.visual)
    }

    pub fn audible_alert(&self) -> AudibleAlert {
        self.current.map_or(AudibleAlert::None, |a| a.audible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manager_renders_nothing() {
        let mut am = AlertManager::new();
        am.process_alerts(0, None);
        assert!(am.current().is_none());
        assert_eq!(am.text1(), "");
        assert_eq!(am.size(), AlertSize::None);
    }

    #[test]
    fn highest_priority_wins() {
        let mut am = AlertManager::new();
        am.add_many(
            0,
            &[
                (AlertClass::Permanent, Alert::permanent("background", "")),
                (
                    AlertClass::ImmediateDisable,
                    Alert::immediate_disable("CAN Error"),
                ),
            ],
        );
        am.process_alerts(0, None);
        assert_eq!(am.text1(), "TAKE CONTROL IMMEDIATELY");
        assert_eq!(am.status(), AlertStatus::Critical);
    }

    #[test]
    fn alerts_expire_after_duration() {
        let mut am = AlertManager::new();
        let alert = Alert::no_entry("Out of Storage"); // 3 s = 300 ticks
        am.add_many(10, &[(AlertClass::NoEntry, alert)]);
        am.process_alerts(10, None);
        assert!(am.current().is_some());
        am.process_alerts(309, None);
        assert!(am.current().is_some());
        am.process_alerts(310, None);
        assert!(am.current().is_none());
    }

    #[test]
    fn refresh_extends_lifetime() {
        let mut am = AlertManager::new();
        let alert = Alert::permanent("Dashcam Mode", ""); // 20-tick lifetime
        am.add_many(0, &[(AlertClass::Permanent, alert)]);
        am.add_many(15, &[(AlertClass::Permanent, alert)]);
        am.process_alerts(30, None);
        assert!(am.current().is_some());
        am.process_alerts(36, None);
        assert!(am.current().is_none());
    }

    #[test]
    fn clear_class_drops_warning_on_disengage() {
        let mut am = AlertManager::new();
        am.add_many(
            0,
            &[(
                AlertClass::Warning,
                Alert::warning("Take Control", "", VisualAlert::SteerRequired,
                               AudibleAlert::PromptRepeat, 1.0),
            )],
        );
        am.process_alerts(0, None);
        assert!(am.current().is_some());
        am.process_alerts(1, Some(AlertClass::Warning));
        assert!(am.current().is_none());
    }

    #[test]
    fn freshest_breaks_priority_ties() {
        let mut am = AlertManager::new();
        let older = Alert::no_entry("Brake Hold Active");
        let newer = Alert::no_entry("Out of Storage");
        am.add_many(0, &[(AlertClass::NoEntry, older)]);
        am.process_alerts(0, None);
        am.add_many(5, &[(AlertClass::Permanent, newer)]);
        am.process_alerts(5, None);
        assert_eq!(am.text2(), "Out of Storage");
    }
}
