use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEvent {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub request_id: Uuid,
    pub passenger_id: Uuid,
    pub pickup_distance_km: f64,
    pub dropoff_distance_km: f64,
    pub matched_at: DateTime<Utc>,
}
