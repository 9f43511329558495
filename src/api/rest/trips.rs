use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::proximity::{round_km, ProximityMatch};
use crate::error::AppError;
use crate::geo::{GeoPoint, Place};
use crate::models::trip::{reference_code, Trip, TripStatus, VehicleInfo};
use crate::models::trip_request::{TripRequest, TripRequestStatus};
use crate::state::AppState;
use crate::validation::{
    require_non_empty, validate_departure, validate_fare, validate_max_distance,
    validate_horizon, validate_passenger_count, validate_place, validate_point, validate_seats,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trips/book", post(book_trip))
        .route("/trips/share", post(share_trip))
        .route("/trips/search", get(search_trips))
        .route("/trips/:id", get(get_trip))
        .route("/trips/:id/status", patch(update_trip_status))
        .route("/trips/:id/location", post(update_trip_location))
}

fn default_passengers() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct BookTripRequest {
    pub passenger_id: Uuid,
    #[serde(default)]
    pub pickup_name: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    #[serde(default)]
    pub dropoff_name: String,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub departure_time: DateTime<Utc>,
    #[serde(default = "default_passengers")]
    pub passengers_count: u32,
    pub max_distance_km: Option<f64>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub departure_time: DateTime<Utc>,
    pub max_distance_km: Option<f64>,
}

#[derive(Deserialize)]
pub struct ShareTripRequest {
    pub driver_id: Uuid,
    pub driver_name: String,
    pub vehicle: Option<VehicleInfo>,
    pub pickup_name: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_name: String,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub departure_time: DateTime<Utc>,
    pub available_seats: u32,
    pub fare_per_passenger: f64,
    #[serde(default = "default_true")]
    pub allows_luggage: bool,
    #[serde(default)]
    pub allows_pets: bool,
    pub notes: Option<String>,
    /// Keep the trip `pending` instead of publishing it straight away.
    #[serde(default)]
    pub draft: bool,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TripStatus,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

/// One ranked search hit as shown to the passenger.
#[derive(Debug, Serialize)]
pub struct TripCandidate {
    pub trip_id: Uuid,
    pub trip_code: String,
    pub driver_name: String,
    pub pickup_location: Place,
    pub dropoff_location: Place,
    pub departure_time: DateTime<Utc>,
    pub available_seats: u32,
    pub fare_per_passenger: f64,
    pub pickup_distance_km: f64,
    pub dropoff_distance_km: f64,
}

impl From<ProximityMatch<Trip>> for TripCandidate {
    fn from(found: ProximityMatch<Trip>) -> Self {
        let trip = found.candidate;
        Self {
            trip_id: trip.id,
            trip_code: trip.trip_code,
            driver_name: trip.driver_name,
            pickup_location: trip.pickup,
            dropoff_location: trip.dropoff,
            departure_time: trip.scheduled_departure_time,
            available_seats: trip.available_seats,
            fare_per_passenger: trip.fare_per_passenger,
            pickup_distance_km: round_km(found.pickup_distance_km),
            dropoff_distance_km: round_km(found.dropoff_distance_km),
        }
    }
}

#[derive(Serialize)]
pub struct BookTripResponse {
    pub success: bool,
    pub request: TripRequest,
    pub trips: Vec<TripCandidate>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub trips: Vec<TripCandidate>,
}

#[derive(Serialize)]
pub struct ShareTripResponse {
    pub success: bool,
    pub trip: Trip,
    pub matched_requests_count: usize,
}

#[derive(Serialize)]
pub struct TripResponse {
    pub success: bool,
    pub trip: Trip,
}

async fn book_trip(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookTripRequest>,
) -> Result<Json<BookTripResponse>, AppError> {
    let now = Utc::now();
    let pickup = Place::new(payload.pickup_name, payload.pickup_lat, payload.pickup_lng);
    let dropoff = Place::new(payload.dropoff_name, payload.dropoff_lat, payload.dropoff_lng);

    validate_place("pickup", &pickup, &state.region)?;
    validate_place("dropoff", &dropoff, &state.region)?;
    validate_departure(payload.departure_time, now)?;
    validate_passenger_count(payload.passengers_count)?;
    validate_max_distance(payload.max_distance_km)?;

    let expires_at = payload
        .departure_time
        .checked_add_signed(state.matcher.settings().time_window)
        .ok_or_else(|| {
            AppError::Validation("departure time is too far in the future".to_string())
        })?;

    let request = TripRequest {
        id: Uuid::new_v4(),
        request_code: reference_code("RQ"),
        passenger_id: payload.passenger_id,
        pickup,
        dropoff,
        requested_departure_time: payload.departure_time,
        passengers_count: payload.passengers_count,
        status: TripRequestStatus::Searching,
        matched_trip: None,
        expires_at,
        created_at: now,
        version: 0,
    };
    let request = state.store.insert_request(request)?;

    let matches = state.matcher.search_available_trips(
        &*state.store,
        &request.pickup.point,
        &request.dropoff.point,
        request.requested_departure_time,
        payload.max_distance_km,
    )?;

    info!(
        request_id = %request.id,
        passenger_id = %request.passenger_id,
        candidates = matches.len(),
        "trip request created"
    );

    Ok(Json(BookTripResponse {
        success: true,
        request,
        trips: matches.into_iter().map(TripCandidate::from).collect(),
    }))
}

async fn search_trips(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let pickup = GeoPoint::new(query.pickup_lat, query.pickup_lng);
    let dropoff = GeoPoint::new(query.dropoff_lat, query.dropoff_lng);

    validate_point("pickup", &pickup, &state.region)?;
    validate_point("dropoff", &dropoff, &state.region)?;
    validate_horizon(query.departure_time, Utc::now())?;
    validate_max_distance(query.max_distance_km)?;

    let matches = state.matcher.search_available_trips(
        &*state.store,
        &pickup,
        &dropoff,
        query.departure_time,
        query.max_distance_km,
    )?;

    Ok(Json(SearchResponse {
        success: true,
        trips: matches.into_iter().map(TripCandidate::from).collect(),
    }))
}

async fn share_trip(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ShareTripRequest>,
) -> Result<Json<ShareTripResponse>, AppError> {
    let now = Utc::now();
    let pickup = Place::new(payload.pickup_name, payload.pickup_lat, payload.pickup_lng);
    let dropoff = Place::new(payload.dropoff_name, payload.dropoff_lat, payload.dropoff_lng);

    require_non_empty("driver_name", &payload.driver_name)?;
    require_non_empty("pickup_name", &pickup.name)?;
    require_non_empty("dropoff_name", &dropoff.name)?;
    validate_place("pickup", &pickup, &state.region)?;
    validate_place("dropoff", &dropoff, &state.region)?;
    validate_departure(payload.departure_time, now)?;
    validate_seats(payload.available_seats)?;
    validate_fare(payload.fare_per_passenger)?;

    let status = if payload.draft {
        TripStatus::Pending
    } else {
        TripStatus::Scheduled
    };

    let trip = Trip {
        id: Uuid::new_v4(),
        trip_code: reference_code("TR"),
        driver_id: payload.driver_id,
        driver_name: payload.driver_name.trim().to_string(),
        vehicle: payload.vehicle,
        status,
        pickup,
        dropoff,
        scheduled_departure_time: payload.departure_time,
        seat_capacity: payload.available_seats,
        available_seats: payload.available_seats,
        fare_per_passenger: payload.fare_per_passenger,
        allows_luggage: payload.allows_luggage,
        allows_pets: payload.allows_pets,
        notes: payload.notes,
        current_location: None,
        last_location_update: None,
        created_at: now,
        updated_at: now,
        cancelled_at: None,
        cancellation_reason: None,
    };
    let trip = state.store.insert_trip(trip)?;

    let matched_requests_count = if trip.status == TripStatus::Scheduled {
        state
            .matcher
            .match_pending_requests(&*state.store, &trip)?
            .len()
    } else {
        0
    };

    info!(
        trip_id = %trip.id,
        driver_id = %trip.driver_id,
        status = ?trip.status,
        matched_requests_count,
        "trip shared"
    );

    Ok(Json(ShareTripResponse {
        success: true,
        trip,
        matched_requests_count,
    }))
}

async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripResponse>, AppError> {
    let trip = state.store.get_trip(id)?;
    Ok(Json(TripResponse {
        success: true,
        trip,
    }))
}

async fn update_trip_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ShareTripResponse>, AppError> {
    let now = Utc::now();
    let trip = state.store.update_trip(id, &mut |trip| {
        trip.transition(payload.status, payload.reason.clone(), now)
    })?;

    // a trip that just got published joins the pool waiting requests are matched against
    let matched_requests_count = if trip.status == TripStatus::Scheduled {
        state
            .matcher
            .match_pending_requests(&*state.store, &trip)?
            .len()
    } else {
        0
    };

    info!(trip_id = %trip.id, status = ?trip.status, "trip status updated");

    Ok(Json(ShareTripResponse {
        success: true,
        trip,
        matched_requests_count,
    }))
}

async fn update_trip_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<TripResponse>, AppError> {
    let point = GeoPoint::new(payload.lat, payload.lng);
    validate_point("current", &point, &state.region)?;

    let now = Utc::now();
    let trip = state
        .store
        .update_trip(id, &mut |trip| trip.record_location(point, now))?;

    Ok(Json(TripResponse {
        success: true,
        trip,
    }))
}
