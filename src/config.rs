use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::application::capture::CaptureConfig;
use crate::presentation::formatter::{FormatOptions, DEFAULT_LONG_TEXT_THRESHOLD};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (a `.env` file is honoured by
/// the binary).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub snapshot_timeout: Duration,
    pub long_text_threshold: usize,
    pub utc_offset_minutes: i32,
}

impl HistoryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080)?;
        let timeout_ms: u64 = parse_or(&lookup, "SNAPSHOT_TIMEOUT_MS", 2000)?;
        let long_text_threshold = parse_or(
            &lookup,
            "HISTORY_LONG_TEXT_THRESHOLD",
            DEFAULT_LONG_TEXT_THRESHOLD,
        )?;
        let utc_offset_minutes = parse_or(&lookup, "HISTORY_UTC_OFFSET_MINUTES", -360)?;

        Ok(Self {
            database_url,
            host,
            port,
            snapshot_timeout: Duration::from_millis(timeout_ms),
            long_text_threshold,
            utc_offset_minutes,
        })
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            snapshot_timeout: self.snapshot_timeout,
        }
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            long_text_threshold: self.long_text_threshold,
            utc_offset_minutes: self.utc_offset_minutes,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}
