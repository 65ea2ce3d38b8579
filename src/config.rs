use std::env;

use crate::error::AppError;

/// Score multiplier applied to Express orders. Every candidate for an order
/// is scaled alike, so it changes the reported score, never the winner.
pub const DEFAULT_EXPRESS_SCORE_FACTOR: f64 = 0.5;

/// Assumed urban driving speed used for route duration estimates.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other}, expected compact/json")),
        }
    }
}

/// Tunables of the assignment engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchSettings {
    pub express_score_factor: f64,
    pub average_speed_kmh: f64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            express_score_factor: DEFAULT_EXPRESS_SCORE_FACTOR,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

impl DispatchSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.express_score_factor.is_finite() || self.express_score_factor <= 0.0 {
            return Err(AppError::Internal(format!(
                "invalid EXPRESS_SCORE_FACTOR: {} must be finite and > 0",
                self.express_score_factor
            )));
        }
        if !self.average_speed_kmh.is_finite() || self.average_speed_kmh <= 0.0 {
            return Err(AppError::Internal(format!(
                "invalid AVERAGE_SPEED_KMH: {} must be finite and > 0",
                self.average_speed_kmh
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub dispatch: DispatchSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let dispatch = DispatchSettings {
            express_score_factor: parse_or_default(
                "EXPRESS_SCORE_FACTOR",
                DEFAULT_EXPRESS_SCORE_FACTOR,
            )?,
            average_speed_kmh: parse_or_default("AVERAGE_SPEED_KMH", DEFAULT_AVERAGE_SPEED_KMH)?,
        };
        dispatch.validate()?;

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: parse_or_default("LOG_FORMAT", LogFormat::Compact)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            dispatch,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
