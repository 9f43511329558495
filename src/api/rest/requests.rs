use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::trip_request::{TripRequest, TripRequestStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/cancel", post(cancel_request))
}

#[derive(Serialize)]
pub struct RequestResponse {
    pub success: bool,
    pub request: TripRequest,
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RequestResponse>, AppError> {
    let request = state.store.get_request(id)?;
    Ok(Json(RequestResponse {
        success: true,
        request,
    }))
}

async fn cancel_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RequestResponse>, AppError> {
    let current = state.store.get_request(id)?;
    let request = state
        .store
        .transition_request(id, current.version, &mut |request| match request.status {
            TripRequestStatus::Searching | TripRequestStatus::Matched => {
                request.status = TripRequestStatus::Cancelled;
                Ok(())
            }
            other => Err(AppError::Conflict(format!(
                "trip request {id} is {other:?} and cannot be cancelled"
            ))),
        })?;

    info!(request_id = %request.id, "trip request cancelled");

    Ok(Json(RequestResponse {
        success: true,
        request,
    }))
}
