use chrono::{DateTime, Utc};
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::{GeoPoint, Place};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Pending,
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn can_transition_to(self, next: TripStatus) -> bool {
        use TripStatus::*;

        matches!(
            (self, next),
            (Pending, Scheduled)
                | (Scheduled, Active)
                | (Active, Completed)
                | (Pending, Cancelled)
                | (Scheduled, Cancelled)
        )
    }

    pub fn is_final(self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleInfo {
    pub make: String,
    pub model: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub trip_code: String,
    pub driver_id: Uuid,
    pub driver_name: String,
    pub vehicle: Option<VehicleInfo>,
    pub status: TripStatus,
    pub pickup: Place,
    pub dropoff: Place,
    pub scheduled_departure_time: DateTime<Utc>,
    pub seat_capacity: u32,
    pub available_seats: u32,
    pub fare_per_passenger: f64,
    pub allows_luggage: bool,
    pub allows_pets: bool,
    pub notes: Option<String>,
    pub current_location: Option<GeoPoint>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl Trip {
    /// Open for matching and booking: scheduled with at least one free seat.
    pub fn is_bookable(&self) -> bool {
        self.status == TripStatus::Scheduled && self.available_seats > 0
    }

    pub fn transition(
        &mut self,
        next: TripStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "trip {} cannot move from {:?} to {:?}",
                self.id, self.status, next
            )));
        }

        self.status = next;
        self.updated_at = now;
        if next == TripStatus::Cancelled {
            self.cancelled_at = Some(now);
            self.cancellation_reason = reason;
        }

        Ok(())
    }

    pub fn reserve_seats(&mut self, seats: u32, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.status.is_final() {
            return Err(AppError::Conflict(format!("trip {} is closed", self.id)));
        }

        self.available_seats = self.available_seats.checked_sub(seats).ok_or_else(|| {
            AppError::Conflict(format!(
                "trip {} has {} seats left, {} requested",
                self.id, self.available_seats, seats
            ))
        })?;
        self.updated_at = now;

        Ok(())
    }

    pub fn record_location(&mut self, point: GeoPoint, now: DateTime<Utc>) -> Result<(), AppError> {
        if !matches!(self.status, TripStatus::Scheduled | TripStatus::Active) {
            return Err(AppError::Conflict(format!(
                "trip {} is {:?}; location updates need a scheduled or active trip",
                self.id, self.status
            )));
        }

        self.current_location = Some(point);
        self.last_location_update = Some(now);
        self.updated_at = now;

        Ok(())
    }
}

/// `TR`/`RQ` style human-readable reference codes.
pub fn reference_code(prefix: &str) -> String {
    let suffix = Alphanumeric.sample_string(&mut rand::thread_rng(), 8);
    format!("{prefix}{}", suffix.to_uppercase())
}
