//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use study_focus_core::Calendar;
use tracing::Level;

/// Largest offset accepted for `UTC_OFFSET_MINUTES`, in minutes.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Longest work or break interval, in minutes.
const MAX_INTERVAL_MINUTES: u32 = 24 * 60;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding one JSON file per storage key.
    pub data_dir: PathBuf,
    pub log_level: Level,
    /// Offset of the user's calendar from UTC.
    pub utc_offset_minutes: i32,
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let utc_offset_minutes: i32 = parse_or("UTC_OFFSET_MINUTES", &lookup, 0)?;
        if utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue(
                "UTC_OFFSET_MINUTES".to_string(),
                format!("{} is outside ±{} minutes", utc_offset_minutes, MAX_OFFSET_MINUTES),
            ));
        }

        let work_minutes = interval("WORK_MINUTES", parse_or("WORK_MINUTES", &lookup, 25)?)?;
        let break_minutes = interval("BREAK_MINUTES", parse_or("BREAK_MINUTES", &lookup, 5)?)?;

        Ok(Self {
            data_dir,
            log_level,
            utc_offset_minutes,
            work_minutes,
            break_minutes,
        })
    }

    pub fn calendar(&self) -> Calendar {
        // The range is checked at load time, so this cannot fall through.
        Calendar::from_offset_minutes(self.utc_offset_minutes).unwrap_or_default()
    }

    pub fn work_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.work_minutes) * 60)
    }

    pub fn break_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.break_minutes) * 60)
    }
}

fn parse_or<T, F>(name: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}

fn interval(name: &str, value: u32) -> Result<u32, ConfigError> {
    if !(1..=MAX_INTERVAL_MINUTES).contains(&value) {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("must be between 1 and {} minutes", MAX_INTERVAL_MINUTES),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.work_interval(), Duration::from_secs(25 * 60));
        assert_eq!(config.break_interval(), Duration::from_secs(5 * 60));
    }

    #[test]
    fn explicit_values_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATA_DIR", "/tmp/focus"),
            ("RUST_LOG", "debug"),
            ("UTC_OFFSET_MINUTES", "-300"),
            ("WORK_MINUTES", "50"),
            ("BREAK_MINUTES", "10"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/focus"));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.calendar().offset().local_minus_utc(), -300 * 60);
        assert_eq!(config.work_minutes, 50);
        assert_eq!(config.break_minutes, 10);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = Config::from_lookup(lookup_from(&[("RUST_LOG", "chatty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "RUST_LOG"));

        let err = Config::from_lookup(lookup_from(&[("UTC_OFFSET_MINUTES", "900")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "UTC_OFFSET_MINUTES"));

        let err = Config::from_lookup(lookup_from(&[("WORK_MINUTES", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "WORK_MINUTES"));

        let err = Config::from_lookup(lookup_from(&[("BREAK_MINUTES", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "BREAK_MINUTES"));
    }

    #[test]
    fn interval_lengths_are_capped_at_a_day() {
        let config = Config::from_lookup(lookup_from(&[("WORK_MINUTES", "1440")])).unwrap();
        assert_eq!(config.work_minutes, 1440);

        let err = Config::from_lookup(lookup_from(&[("WORK_MINUTES", "1441")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "WORK_MINUTES"));

        let err = Config::from_lookup(lookup_from(&[("BREAK_MINUTES", "71582789")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v, _) if v == "BREAK_MINUTES"));
    }
}
