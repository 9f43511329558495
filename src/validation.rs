use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;
use crate::geo::{GeoPoint, Place, ServiceRegion};

pub const MAX_SEATS: u32 = 8;

/// How far ahead a departure may be scheduled or searched for.
pub const BOOKING_HORIZON_DAYS: i64 = 365;

pub fn validate_point(label: &str, point: &GeoPoint, region: &ServiceRegion) -> Result<(), AppError> {
    if !point.is_valid() {
        return Err(AppError::Validation(format!(
            "{label} coordinates ({}, {}) are out of range",
            point.lat, point.lng
        )));
    }

    if !region.contains(point) {
        return Err(AppError::Validation(format!(
            "{label} location is out of allowed bounds"
        )));
    }

    Ok(())
}

pub fn validate_place(label: &str, place: &Place, region: &ServiceRegion) -> Result<(), AppError> {
    if place.name.len() > 255 {
        return Err(AppError::Validation(format!(
            "{label} name is longer than 255 characters"
        )));
    }

    validate_point(label, &place.point, region)
}

pub fn validate_departure(departure: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
    if departure <= now {
        return Err(AppError::Validation(
            "departure time must be in the future".to_string(),
        ));
    }
    validate_horizon(departure, now)
}

pub fn validate_horizon(departure: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
    let horizon = now
        .checked_add_signed(Duration::days(BOOKING_HORIZON_DAYS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    if departure > horizon {
        return Err(AppError::Validation(format!(
            "departure time must be within {BOOKING_HORIZON_DAYS} days"
        )));
    }
    Ok(())
}

pub fn validate_passenger_count(count: u32) -> Result<(), AppError> {
    if count == 0 || count > MAX_SEATS {
        return Err(AppError::Validation(format!(
            "passengers_count must be between 1 and {MAX_SEATS}"
        )));
    }
    Ok(())
}

pub fn validate_seats(seats: u32) -> Result<(), AppError> {
    if seats == 0 || seats > MAX_SEATS {
        return Err(AppError::Validation(format!(
            "available_seats must be between 1 and {MAX_SEATS}"
        )));
    }
    Ok(())
}

pub fn validate_fare(fare: f64) -> Result<(), AppError> {
    if !fare.is_finite() || fare < 0.0 {
        return Err(AppError::Validation(
            "fare_per_passenger must be a non-negative amount".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_max_distance(max_km: Option<f64>) -> Result<(), AppError> {
    match max_km {
        Some(km) if !km.is_finite() || km <= 0.0 => Err(AppError::Validation(
            "max_distance_km must be greater than zero".to_string(),
        )),
        _ => Ok(()),
    }
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn points_outside_region_are_rejected() {
        let region = ServiceRegion::default();
        assert!(validate_point("pickup", &GeoPoint::new(24.7, 46.7), &region).is_ok());
        assert!(validate_point("pickup", &GeoPoint::new(48.85, 2.35), &region).is_err());
        assert!(validate_point("pickup", &GeoPoint::new(95.0, 46.7), &region).is_err());
        assert!(validate_point("pickup", &GeoPoint::new(f64::INFINITY, 46.7), &region).is_err());
    }

    #[test]
    fn departure_must_be_strictly_future() {
        let now = Utc::now();
        assert!(validate_departure(now + Duration::minutes(1), now).is_ok());
        assert!(validate_departure(now, now).is_err());
        assert!(validate_departure(now - Duration::hours(1), now).is_err());
    }

    #[test]
    fn departure_beyond_horizon_is_rejected() {
        let now = Utc::now();
        let last_day = now + Duration::days(BOOKING_HORIZON_DAYS);

        assert!(validate_departure(last_day, now).is_ok());
        assert!(validate_departure(last_day + Duration::seconds(1), now).is_err());
        assert!(validate_departure(DateTime::<Utc>::MAX_UTC, now).is_err());

        // searching may look back, but not past the horizon
        assert!(validate_horizon(now - Duration::hours(1), now).is_ok());
        assert!(validate_horizon(DateTime::<Utc>::MAX_UTC, now).is_err());
    }

    #[test]
    fn counts_and_fares_are_bounded() {
        assert!(validate_passenger_count(0).is_err());
        assert!(validate_passenger_count(1).is_ok());
        assert!(validate_passenger_count(9).is_err());
        assert!(validate_seats(4).is_ok());
        assert!(validate_seats(0).is_err());
        assert!(validate_fare(0.0).is_ok());
        assert!(validate_fare(-1.0).is_err());
        assert!(validate_fare(f64::NAN).is_err());
        assert!(validate_max_distance(None).is_ok());
        assert!(validate_max_distance(Some(0.0)).is_err());
        assert!(validate_max_distance(Some(2.5)).is_ok());
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(require_non_empty("driver_name", "  ").is_err());
        assert!(require_non_empty("driver_name", "Noura").is_ok());
    }
}
