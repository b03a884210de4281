use std::env;
use std::time::Duration;

use crate::engine::acquisition::AcquireConfig;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub settings: Settings,
}

/// Runtime knobs shared by request handlers and find sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub search_radius_km: f64,
    pub sample_fallback: bool,
    pub session_sample_buffer: usize,
    pub locate: AcquireConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_radius_km: 10.0,
            sample_fallback: true,
            session_sample_buffer: 32,
            locate: AcquireConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = Settings::default();
        let search_radius_km: f64 =
            parse_or_default("SEARCH_RADIUS_KM", defaults.search_radius_km)?;
        if search_radius_km.is_nan() || search_radius_km <= 0.0 {
            return Err(AppError::Internal(format!(
                "invalid SEARCH_RADIUS_KM: {search_radius_km} must be > 0"
            )));
        }

        let locate = AcquireConfig {
            acceptable_accuracy_m: parse_or_default(
                "LOCATION_ACCEPTABLE_ACCURACY_M",
                defaults.locate.acceptable_accuracy_m,
            )?,
            max_wait: Duration::from_millis(parse_or_default("LOCATION_MAX_WAIT_MS", 10_000)?),
            per_sample_timeout: Duration::from_millis(parse_or_default(
                "LOCATION_SAMPLE_TIMEOUT_MS",
                8_000,
            )?),
            use_cache: parse_or_default("LOCATION_USE_CACHE", defaults.locate.use_cache)?,
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            settings: Settings {
                search_radius_km,
                sample_fallback: parse_or_default(
                    "SAMPLE_GARAGE_FALLBACK",
                    defaults.sample_fallback,
                )?,
                session_sample_buffer: parse_or_default(
                    "SESSION_SAMPLE_BUFFER",
                    defaults.session_sample_buffer,
                )?,
                locate,
            },
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
