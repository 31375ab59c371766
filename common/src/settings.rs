use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alarm::Bounds;

/// Environment variable pointing at a JSON settings file.
pub const SETTINGS_ENV_VAR: &str = "TEMPERATURE_MONITOR_SETTINGS";

/// Parameters of the simulated temperature signal.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SignalSettings {
    pub baseline: f64,
    pub amplitude: f64,
    /// In radians per second of simulated time.
    pub angular_frequency: f64,
    pub noise_std_dev: f64,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            baseline: 20.0,
            amplitude: 8.0,
            angular_frequency: 0.5,
            noise_std_dev: 0.2,
        }
    }
}

/// Initial alarm limits and the range the limit inputs accept.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LimitSettings {
    pub min: f64,
    pub max: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Increment of one press on a limit input.
    pub step: f64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            min: 15.0,
            max: 25.0,
            lower_bound: -50.0,
            upper_bound: 150.0,
            step: 0.5,
        }
    }
}

impl LimitSettings {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min: self.min,
            max: self.max,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower_bound, self.upper_bound)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ZoomSettings {
    pub in_factor: f64,
    pub out_factor: f64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            in_factor: 0.8,
            out_factor: 1.25,
        }
    }
}

/// Everything that can be tuned without recompiling.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub sample_interval_ms: u64,
    pub blink_interval_ms: u64,
    /// Number of readings kept for the plot.
    pub history_len: usize,
    pub signal: SignalSettings,
    pub limits: LimitSettings,
    pub zoom: ZoomSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_interval_ms: 200,
            blink_interval_ms: 400,
            history_len: 100,
            signal: SignalSettings::default(),
            limits: LimitSettings::default(),
            zoom: ZoomSettings::default(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "could not read settings: {e}"),
            Self::Parse(e) => write!(f, "could not parse settings: {e}"),
            Self::Invalid(reason) => write!(f, "invalid settings: {reason}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}

impl Settings {
    /// Parse and validate settings from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load the file named by [`SETTINGS_ENV_VAR`], falling back to the defaults.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(SETTINGS_ENV_VAR) else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", Path::new(&path).display());
                settings
            }
            Err(e) => {
                log::warn!(
                    "Ignoring {}: {e}. Using default settings.",
                    Path::new(&path).display()
                );
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |reason: &str| Err(SettingsError::Invalid(reason.to_string()));

        if self.sample_interval_ms == 0 {
            return invalid("sample_interval_ms must be greater than zero");
        }
        if self.blink_interval_ms == 0 {
            return invalid("blink_interval_ms must be greater than zero");
        }
        if self.history_len == 0 {
            return invalid("history_len must be greater than zero");
        }
        if !(self.signal.noise_std_dev.is_finite() && self.signal.noise_std_dev >= 0.0) {
            return invalid("signal.noise_std_dev must be a non-negative number");
        }

        let limits = &self.limits;
        if !(limits.lower_bound < limits.upper_bound) {
            return invalid("limits.lower_bound must be below limits.upper_bound");
        }
        let in_range = |v: f64| (limits.lower_bound..=limits.upper_bound).contains(&v);
        if !in_range(limits.min) || !in_range(limits.max) {
            return invalid("limits.min and limits.max must lie within the input range");
        }
        if !(limits.step > 0.0 && limits.step.is_finite()) {
            return invalid("limits.step must be greater than zero");
        }

        if !(self.zoom.in_factor > 0.0 && self.zoom.in_factor < 1.0) {
            return invalid("zoom.in_factor must be between 0 and 1");
        }
        if !(self.zoom.out_factor > 1.0 && self.zoom.out_factor.is_finite()) {
            return invalid("zoom.out_factor must be greater than 1");
        }

        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_settings_match_defaults() {
        let json = std::include_str!("./default_settings.json");
        let settings = Settings::from_json(json).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.sample_interval(), Duration::from_millis(200));
        assert_eq!(settings.blink_interval(), Duration::from_millis(400));
    }

    #[test]
    fn missing_fields_keep_their_defaults() {
        let settings = Settings::from_json(r#"{ "history_len": 50, "limits": { "max": 30.0 } }"#).unwrap();

        assert_eq!(settings.history_len, 50);
        assert_eq!(settings.limits.max, 30.0);
        assert_eq!(settings.limits.min, 15.0);
        assert_eq!(settings.signal, SignalSettings::default());
    }

    #[test]
    fn rejects_invalid_values() {
        for json in [
            r#"{ "sample_interval_ms": 0 }"#,
            r#"{ "history_len": 0 }"#,
            r#"{ "limits": { "max": 200.0 } }"#,
            r#"{ "limits": { "lower_bound": 10.0, "upper_bound": -10.0 } }"#,
            r#"{ "zoom": { "in_factor": 1.5 } }"#,
            r#"{ "signal": { "noise_std_dev": -0.1 } }"#,
        ] {
            assert!(
                matches!(Settings::from_json(json), Err(SettingsError::Invalid(_))),
                "accepted {json}"
            );
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            Settings::load("/nonexistent/temperature-monitor.json"),
            Err(SettingsError::Io(_))
        ));
    }

    #[test]
    fn clamp_to_input_range() {
        let limits = LimitSettings::default();

        assert_eq!(limits.clamp(200.0), 150.0);
        assert_eq!(limits.clamp(-80.0), -50.0);
        assert_eq!(limits.clamp(21.5), 21.5);
    }
}
