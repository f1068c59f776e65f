//! Supervisor configuration: TOML live-tuning file, persistent-parameter
//! toggles and environment flags, merged into one validated bundle at
//! startup.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::{ParamError, ParamStore};

/// Configuration loading/validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Tuning file I/O error.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    /// TOML parse error.
    #[error("tuning parse error: {0}")]
    Parse(String),
    /// Parameter bound violated.
    #[error("tuning validation: {0}")]
    Validation(String),
    /// Parameter store error.
    #[error(transparent)]
    Params(#[from] ParamError),
}

/// Live tuning values. All fields have conservative defaults so a missing
/// or partial file still yields a drivable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Prefer the online steer-ratio estimate over the static one.
    pub use_live_steer_ratio: bool,
    /// Static steer ratio override.
    pub steer_ratio: f64,
    /// Lateral camera mount offset [m].
    pub camera_offset: f64,
    /// Steering actuator lag [s].
    pub steer_actuator_delay: f64,
    /// Longitudinal gas scaling.
    pub scc_gas_factor: f64,
    /// Longitudinal brake scaling.
    pub scc_brake_factor: f64,
    /// Curve-speed aggressiveness, 0.5..1.5.
    pub scc_curvature_factor: f64,
    /// Longitudinal actuator delay lower bound [s].
    pub long_actuator_delay_lower: f64,
    /// Longitudinal actuator delay upper bound [s].
    pub long_actuator_delay_upper: f64,
    /// Clamp set-speed on curves.
    pub slow_on_curves: bool,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            use_live_steer_ratio: true,
            steer_ratio: 13.5,
            camera_offset: adas_common::consts::CAMERA_OFFSET,
            steer_actuator_delay: 0.1,
            scc_gas_factor: 1.0,
            scc_brake_factor: 1.0,
            scc_curvature_factor: 0.98,
            long_actuator_delay_lower: 0.15,
            long_actuator_delay_upper: 0.5,
            slow_on_curves: true,
        }
    }
}

impl TuningConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };
        let tuning: Self =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Bound checks on factors that scale safety-relevant speeds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.5..=1.5).contains(&self.scc_curvature_factor) {
            return Err(ConfigError::Validation(format!(
                "scc_curvature_factor {} out of [0.5, 1.5]",
                self.scc_curvature_factor
            )));
        }
        if self.steer_ratio <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "steer_ratio {} must be positive",
                self.steer_ratio
            )));
        }
        if self.steer_actuator_delay < 0.0 {
            return Err(ConfigError::Validation(
                "steer_actuator_delay must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Process environment flags, read once at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvFlags {
    /// Offline log replay: suppress wall-clock dependent checks.
    pub replay: bool,
    /// Simulator run: relax liveness and resource checks.
    pub simulation: bool,
    /// No IMU/GNSS present: suppress sensor-validity events.
    pub nosensor: bool,
    /// Disable the 100 ms CAN receive timeout.
    pub no_can_timeout: bool,
}

impl EnvFlags {
    /// Read the flags from the process environment.
    pub fn from_env() -> Self {
        Self {
            replay: std::env::var_os("REPLAY").is_some(),
            simulation: std::env::var_os("SIMULATION").is_some(),
            nosensor: std::env::var_os("NOSENSOR").is_some(),
            no_can_timeout: std::env::var_os("NO_CAN_TIMEOUT").is_some(),
        }
    }
}

/// Validated configuration bundle for one supervisor instance.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Actuator passthrough from the debug joystick channel.
    pub joystick_mode: bool,
    pub is_metric: bool,
    pub is_ldw_enabled: bool,
    /// Community-port features allowed by the operator.
    pub community_features: bool,
    /// Master enable toggle; false forces read-only operation.
    pub adas_enabled: bool,
    /// Explicit dashcam-only request.
    pub passive: bool,
    /// Platform carries the wide road camera.
    pub wide_camera: bool,
    pub tuning: TuningConfig,
    pub env: EnvFlags,
}

impl SupervisorConfig {
    /// Assemble the bundle from the persistent parameters, a tuning file
    /// and the environment.
    pub fn load(params: &ParamStore, tuning_path: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            joystick_mode: params.get_bool("JoystickDebugMode"),
            is_metric: params.get_bool("IsMetric"),
            is_ldw_enabled: params.get_bool("IsLdwEnabled"),
            community_features: params.get_bool("CommunityFeaturesToggle"),
            adas_enabled: params.get_bool("OpenpilotEnabledToggle"),
            passive: params.get_bool("Passive"),
            wide_camera: params.get_bool("WideCameraOnly"),
            tuning: TuningConfig::load(tuning_path)?,
            env: EnvFlags::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_defaults_validate() {
        TuningConfig::default().validate().unwrap();
    }

    #[test]
    fn tuning_parse_partial_file() {
        let t: TuningConfig = toml::from_str("scc_curvature_factor = 1.2\n").unwrap();
        assert_eq!(t.scc_curvature_factor, 1.2);
        // Everything else falls back to defaults.
        assert_eq!(t.steer_ratio, 13.5);
        assert!(t.slow_on_curves);
    }

    #[test]
    fn tuning_rejects_out_of_range_curvature_factor() {
        let t = TuningConfig {
            scc_curvature_factor: 2.0,
            ..TuningConfig::default()
        };
        assert!(matches!(t.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn tuning_missing_file_is_default() {
        let t = TuningConfig::load(Path::new("/nonexistent/tuning.toml")).unwrap();
        assert_eq!(t.camera_offset, adas_common::consts::CAMERA_OFFSET);
    }

    #[test]
    fn config_from_params() {
        let dir = tempfile::tempdir().unwrap();
        let params = ParamStore::open(dir.path()).unwrap();
        params.put_bool("IsMetric", true).unwrap();
        params.put_bool("OpenpilotEnabledToggle", true).unwrap();
        let cfg = SupervisorConfig::load(&params, &dir.path().join("tuning.toml")).unwrap();
        assert!(cfg.is_metric);
        assert!(cfg.adas_enabled);
        assert!(!cfg.passive);
        assert!(!cfg.joystick_mode);
    }
}
