use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::geo::Place;
use crate::models::trip::{Trip, TripStatus};
use crate::models::trip_request::{TripRequest, TripRequestStatus};

pub fn trip_at(pickup: (f64, f64), dropoff: (f64, f64), departs: DateTime<Utc>) -> Trip {
    let now = Utc::now();
    Trip {
        id: Uuid::new_v4(),
        trip_code: "TRTEST0001".to_string(),
        driver_id: Uuid::new_v4(),
        driver_name: "Test Driver".to_string(),
        vehicle: None,
        status: TripStatus::Scheduled,
        pickup: Place::new("pickup", pickup.0, pickup.1),
        dropoff: Place::new("dropoff", dropoff.0, dropoff.1),
        scheduled_departure_time: departs,
        seat_capacity: 3,
        available_seats: 3,
        fare_per_passenger: 15.0,
        allows_luggage: true,
        allows_pets: false,
        notes: None,
        current_location: None,
        last_location_update: None,
        created_at: now,
        updated_at: now,
        cancelled_at: None,
        cancellation_reason: None,
    }
}

pub fn request_at(pickup: (f64, f64), dropoff: (f64, f64), departs: DateTime<Utc>) -> TripRequest {
    TripRequest {
        id: Uuid::new_v4(),
        request_code: "RQTEST0001".to_string(),
        passenger_id: Uuid::new_v4(),
        pickup: Place::new("pickup", pickup.0, pickup.1),
        dropoff: Place::new("dropoff", dropoff.0, dropoff.1),
        requested_departure_time: departs,
        passengers_count: 1,
        status: TripRequestStatus::Searching,
        matched_trip: None,
        expires_at: departs + Duration::hours(2),
        created_at: Utc::now(),
        version: 0,
    }
}
