use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Place;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TripRequestStatus {
    Searching,
    Matched,
    Accepted,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub id: Uuid,
    pub request_code: String,
    pub passenger_id: Uuid,
    pub pickup: Place,
    pub dropoff: Place,
    pub requested_departure_time: DateTime<Utc>,
    pub passengers_count: u32,
    pub status: TripRequestStatus,
    pub matched_trip: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every persisted change.
    pub version: u64,
}

impl TripRequest {
    pub fn is_searching(&self) -> bool {
        self.status == TripRequestStatus::Searching
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_searching() && self.expires_at <= now
    }
}
