use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::Place;
use crate::models::booking::{Booking, BookingStatus};
use crate::state::AppState;
use crate::validation::{validate_passenger_count, validate_place};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/trips/:id/bookings",
            post(create_booking).get(list_bookings),
        )
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/accept", post(accept_booking))
        .route("/bookings/:id/reject", post(reject_booking))
}

fn default_seats() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub passenger_id: Uuid,
    #[serde(default = "default_seats")]
    pub seats_requested: u32,
    pub request_id: Option<Uuid>,
    pub pickup: Option<Place>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub success: bool,
    pub booking: Booking,
}

#[derive(Serialize)]
pub struct BookingsResponse {
    pub success: bool,
    pub bookings: Vec<Booking>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    validate_passenger_count(payload.seats_requested)?;
    if let Some(pickup) = &payload.pickup {
        validate_place("pickup", pickup, &state.region)?;
    }

    let trip = state.store.get_trip(trip_id)?;
    if !trip.is_bookable() {
        return Err(AppError::Conflict(format!(
            "trip {trip_id} is not open for bookings"
        )));
    }
    if payload.seats_requested > trip.available_seats {
        return Err(AppError::Conflict(format!(
            "trip {trip_id} has {} seats left",
            trip.available_seats
        )));
    }

    if let Some(request_id) = payload.request_id {
        let request = state.store.get_request(request_id)?;
        if request.passenger_id != payload.passenger_id {
            return Err(AppError::Validation(format!(
                "trip request {request_id} belongs to another passenger"
            )));
        }
    }

    let booking = Booking {
        id: Uuid::new_v4(),
        trip_id,
        passenger_id: payload.passenger_id,
        request_id: payload.request_id,
        seats_requested: payload.seats_requested,
        pickup: payload.pickup,
        fare_amount: trip.fare_per_passenger * payload.seats_requested as f64,
        status: BookingStatus::Pending,
        requested_at: Utc::now(),
        accepted_at: None,
    };
    let booking = state.store.insert_booking(booking)?;

    info!(
        booking_id = %booking.id,
        trip_id = %trip_id,
        seats = booking.seats_requested,
        "booking requested"
    );

    Ok(Json(BookingResponse {
        success: true,
        booking,
    }))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<BookingsResponse>, AppError> {
    state.store.get_trip(trip_id)?;
    let bookings = state.store.list_bookings_for_trip(trip_id)?;

    Ok(Json(BookingsResponse {
        success: true,
        bookings,
    }))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.store.get_booking(id)?;
    Ok(Json(BookingResponse {
        success: true,
        booking,
    }))
}

async fn accept_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.store.accept_booking(id, Utc::now())?;

    info!(booking_id = %booking.id, trip_id = %booking.trip_id, "booking accepted");

    Ok(Json(BookingResponse {
        success: true,
        booking,
    }))
}

async fn reject_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state.store.reject_booking(id)?;

    Ok(Json(BookingResponse {
        success: true,
        booking,
    }))
}
