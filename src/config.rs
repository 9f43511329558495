use std::env;

use chrono::Duration;

use crate::engine::capacity::SeatPolicyKind;
use crate::engine::MatchSettings;
use crate::error::AppError;
use crate::geo::ServiceRegion;
use crate::validation::BOOKING_HORIZON_DAYS;

/// A window wider than the booking horizon cannot exclude anything.
const MAX_TIME_WINDOW_HOURS: f64 = (BOOKING_HORIZON_DAYS * 24) as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub max_distance_km: f64,
    pub time_window_hours: f64,
    pub earth_radius_km: f64,
    pub seat_policy: SeatPolicyKind,
    pub region: ServiceRegion,
    pub expiry_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                Ok("compact") | Err(_) => LogFormat::Compact,
                Ok(other) => {
                    return Err(AppError::Internal(format!(
                        "invalid LOG_FORMAT: {other}, expected compact or json"
                    )));
                }
            },
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            max_distance_km: parse_or_default("MAX_DISTANCE_KM", 5.0)?,
            time_window_hours: parse_or_default("TIME_WINDOW_HOURS", 2.0)?,
            earth_radius_km: parse_or_default("EARTH_RADIUS_KM", crate::geo::EARTH_RADIUS_KM)?,
            seat_policy: parse_or_default("SEAT_POLICY", SeatPolicyKind::Unbounded)?,
            region: ServiceRegion {
                min_lat: parse_or_default("REGION_MIN_LAT", 16.0)?,
                max_lat: parse_or_default("REGION_MAX_LAT", 32.0)?,
                min_lng: parse_or_default("REGION_MIN_LNG", 34.0)?,
                max_lng: parse_or_default("REGION_MAX_LNG", 56.0)?,
            },
            expiry_sweep_secs: parse_or_default("EXPIRY_SWEEP_SECS", 60)?,
        };

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), AppError> {
        if !(self.max_distance_km.is_finite() && self.max_distance_km > 0.0) {
            return Err(AppError::Internal("MAX_DISTANCE_KM must be > 0".to_string()));
        }
        if !(self.time_window_hours.is_finite()
            && (0.0..=MAX_TIME_WINDOW_HOURS).contains(&self.time_window_hours))
        {
            return Err(AppError::Internal(format!(
                "TIME_WINDOW_HOURS must be between 0 and {MAX_TIME_WINDOW_HOURS}"
            )));
        }
        if self.event_buffer_size == 0 {
            return Err(AppError::Internal("EVENT_BUFFER_SIZE must be > 0".to_string()));
        }
        if !(self.earth_radius_km.is_finite() && self.earth_radius_km > 0.0) {
            return Err(AppError::Internal("EARTH_RADIUS_KM must be > 0".to_string()));
        }
        if self.region.min_lat > self.region.max_lat || self.region.min_lng > self.region.max_lng {
            return Err(AppError::Internal("service region bounds are inverted".to_string()));
        }
        if self.expiry_sweep_secs == 0 {
            return Err(AppError::Internal("EXPIRY_SWEEP_SECS must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            max_distance_km: self.max_distance_km,
            time_window: Duration::try_milliseconds((self.time_window_hours * 3_600_000.0) as i64)
                .unwrap_or(Duration::MAX),
            earth_radius_km: self.earth_radius_km,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            event_buffer_size: 1024,
            max_distance_km: 5.0,
            time_window_hours: 2.0,
            earth_radius_km: crate::geo::EARTH_RADIUS_KM,
            seat_policy: SeatPolicyKind::Unbounded,
            region: ServiceRegion::default(),
            expiry_sweep_secs: 60,
        }
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

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::Config;

    #[test]
    fn default_settings_use_five_km_and_two_hours() {
        let settings = Config::default().match_settings();
        assert_eq!(settings.max_distance_km, 5.0);
        assert_eq!(settings.time_window, Duration::hours(2));
        assert_eq!(settings.earth_radius_km, 6_371.0);
    }

    #[test]
    fn fractional_window_hours_convert_to_minutes() {
        let config = Config {
            time_window_hours: 1.5,
            ..Config::default()
        };
        assert_eq!(config.match_settings().time_window, Duration::minutes(90));
    }

    #[test]
    fn oversized_time_window_is_rejected() {
        let config = Config {
            time_window_hours: 1e12,
            ..Config::default()
        };
        assert!(config.check().is_err());

        // settings stay constructible even when the check is skipped
        let saturated = Config {
            time_window_hours: 1e15,
            ..Config::default()
        };
        assert_eq!(saturated.match_settings().time_window, Duration::MAX);

        let year = Config {
            time_window_hours: 24.0 * 365.0,
            ..Config::default()
        };
        assert!(year.check().is_ok());
    }

    #[test]
    fn zero_event_buffer_is_rejected() {
        let config = Config {
            event_buffer_size: 0,
            ..Config::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn inverted_region_is_rejected() {
        let mut config = Config::default();
        config.region.min_lat = 40.0;
        assert!(config.check().is_err());
    }
}
