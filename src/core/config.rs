//! Exhibit configuration with documented constants
//!
//! All tunable numbers of the installation live here. Values can be
//! overridden from a TOML file; anything the file leaves out keeps its default.

use crate::core::error::{AotaError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Longest battle interval or startup delay accepted, in seconds (30 days)
pub const MAX_SCHEDULE_SECS: u64 = 30 * 24 * 60 * 60;

/// Configuration for one exhibit installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhibitConfig {
    /// Longest accepted impression, counted in characters
    ///
    /// Longer submissions are rejected outright and never counted.
    pub max_input_length: usize,

    /// Seconds between steady-state battles
    ///
    /// Also the staleness limit for the startup catch-up: if the last battle
    /// is at least this old when the exhibit starts, a catch-up battle is armed.
    pub battle_interval_secs: u64,

    /// Seconds after startup before the first (or catch-up) battle
    pub battle_startup_delay_secs: u64,

    /// Request a new portrait every N accepted submissions
    pub image_generation_interval: u32,

    /// First day of the exhibition (day 1)
    pub exhibition_start: NaiveDate,

    /// Last day of the exhibition
    pub exhibition_end: NaiveDate,

    /// Opening hours, local wall clock
    pub exhibition_hours: ExhibitionHours,

    /// Text and image generation endpoints
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhibitionHours {
    pub start: u32,
    pub end: u32,
}

impl ExhibitionHours {
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start && hour < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL; the model name is appended for Gemini endpoints
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta/models".into(),
            text_model: "gemini-2.0-flash".into(),
            image_model: "gemini-2.5-flash-image".into(),
        }
    }
}

impl Default for ExhibitConfig {
    fn default() -> Self {
        Self {
            max_input_length: 60,

            // Hourly battles, first one 20s after boot
            battle_interval_secs: 60 * 60,
            battle_startup_delay_secs: 20,

            image_generation_interval: 5,

            exhibition_start: NaiveDate::from_ymd_opt(2025, 3, 6).unwrap_or_default(),
            exhibition_end: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap_or_default(),
            exhibition_hours: ExhibitionHours { start: 12, end: 19 },

            llm: LlmSettings::default(),
        }
    }
}

impl ExhibitConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AotaError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ExhibitConfig = toml::from_str(content)
            .map_err(|e| AotaError::ConfigError(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_input_length == 0 {
            return Err(AotaError::ConfigError(
                "max_input_length must be positive".into(),
            ));
        }

        if self.battle_interval_secs == 0 {
            return Err(AotaError::ConfigError(
                "battle_interval_secs must be positive".into(),
            ));
        }

        if self.battle_interval_secs > MAX_SCHEDULE_SECS {
            return Err(AotaError::ConfigError(format!(
                "battle_interval_secs must be at most {}",
                MAX_SCHEDULE_SECS
            )));
        }

        if self.battle_startup_delay_secs > MAX_SCHEDULE_SECS {
            return Err(AotaError::ConfigError(format!(
                "battle_startup_delay_secs must be at most {}",
                MAX_SCHEDULE_SECS
            )));
        }

        if self.image_generation_interval == 0 {
            return Err(AotaError::ConfigError(
                "image_generation_interval must be positive".into(),
            ));
        }

        if self.exhibition_end < self.exhibition_start {
            return Err(AotaError::ConfigError(format!(
                "exhibition_end ({}) is before exhibition_start ({})",
                self.exhibition_end, self.exhibition_start
            )));
        }

        let hours = self.exhibition_hours;
        if hours.start >= hours.end || hours.end > 24 {
            return Err(AotaError::ConfigError(format!(
                "exhibition_hours {}..{} is not a valid range",
                hours.start, hours.end
            )));
        }

        Ok(())
    }

    pub fn battle_interval(&self) -> Duration {
        Duration::seconds(self.battle_interval_secs.min(MAX_SCHEDULE_SECS) as i64)
    }

    pub fn battle_startup_delay(&self) -> Duration {
        Duration::seconds(self.battle_startup_delay_secs.min(MAX_SCHEDULE_SECS) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExhibitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_input_length, 60);
        assert_eq!(config.battle_interval(), Duration::hours(1));
        assert_eq!(config.battle_startup_delay(), Duration::seconds(20));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExhibitConfig::from_toml(
            r#"
            max_input_length = 40

            [llm]
            text_model = "gemini-2.5-flash"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_input_length, 40);
        assert_eq!(config.battle_interval_secs, 3600);
        assert_eq!(config.llm.text_model, "gemini-2.5-flash");
        assert_eq!(config.llm.image_model, "gemini-2.5-flash-image");
    }

    #[test]
    fn test_dates_parse_from_strings() {
        let config = ExhibitConfig::from_toml(
            r#"
            exhibition_start = "2026-01-10"
            exhibition_end = "2026-01-12"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.exhibition_start,
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = ExhibitConfig::from_toml("battle_interval_secs = 0");
        assert!(matches!(result, Err(AotaError::ConfigError(_))));
    }

    #[test]
    fn test_oversized_schedule_rejected() {
        let result = ExhibitConfig::from_toml("battle_interval_secs = 9223372036854775807");
        assert!(matches!(result, Err(AotaError::ConfigError(_))));

        let result = ExhibitConfig::from_toml("battle_startup_delay_secs = 9223372036854775807");
        assert!(matches!(result, Err(AotaError::ConfigError(_))));

        let at_limit = ExhibitConfig::from_toml(&format!(
            "battle_interval_secs = {}",
            MAX_SCHEDULE_SECS
        ))
        .unwrap();
        assert_eq!(at_limit.battle_interval(), Duration::days(30));
    }

    #[test]
    fn test_unvalidated_durations_do_not_overflow() {
        let config = ExhibitConfig {
            battle_interval_secs: u64::MAX,
            battle_startup_delay_secs: u64::MAX,
            ..ExhibitConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.battle_interval(), Duration::days(30));
        assert_eq!(config.battle_startup_delay(), Duration::days(30));
    }

    #[test]
    fn test_reversed_dates_rejected() {
        let mut config = ExhibitConfig::default();
        std::mem::swap(&mut config.exhibition_start, &mut config.exhibition_end);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_opening_hours() {
        let hours = ExhibitConfig::default().exhibition_hours;
        assert!(!hours.contains(11));
        assert!(hours.contains(12));
        assert!(hours.contains(18));
        assert!(!hours.contains(19));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/exhibit.toml");
        let config = ExhibitConfig::load(&path).unwrap();
        assert_eq!(config, ExhibitConfig::default());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = ExhibitConfig::load(Path::new("/nonexistent/exhibit.toml"));
        assert!(matches!(result, Err(AotaError::ConfigError(_))));
    }
}
