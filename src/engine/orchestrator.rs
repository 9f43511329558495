use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::engine::capacity::SeatPolicy;
use crate::engine::proximity::{match_candidates, rank_by_pickup_distance, Endpoints, ProximityMatch};
use crate::engine::window::filter_by_window;
use crate::engine::MatchSettings;
use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::match_event::MatchEvent;
use crate::models::trip::Trip;
use crate::models::trip_request::TripRequest;
use crate::observability::metrics::Metrics;
use crate::store::{MatchStore, StagedMatch};

/// Runs the window filter and the proximity matcher in both directions:
/// passenger → trips (read only) and new trip → waiting requests (writes matches).
pub struct MatchOrchestrator {
    settings: MatchSettings,
    seat_policy: Box<dyn SeatPolicy>,
    metrics: Metrics,
    events_tx: broadcast::Sender<MatchEvent>,
}

impl MatchOrchestrator {
    pub fn new(
        settings: MatchSettings,
        seat_policy: Box<dyn SeatPolicy>,
        metrics: Metrics,
        events_tx: broadcast::Sender<MatchEvent>,
    ) -> Self {
        Self {
            settings,
            seat_policy,
            metrics,
            events_tx,
        }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.events_tx.subscribe()
    }

    /// Scheduled trips with free seats departing within the window around
    /// `departure_time` whose pickup and dropoff are both within `max_km`
    /// (the configured threshold when `None`), nearest pickup first.
    pub fn search_available_trips<S: MatchStore + ?Sized>(
        &self,
        store: &S,
        pickup: &GeoPoint,
        dropoff: &GeoPoint,
        departure_time: DateTime<Utc>,
        max_km: Option<f64>,
    ) -> Result<Vec<ProximityMatch<Trip>>, AppError> {
        let start = Instant::now();
        let settings = MatchSettings {
            max_distance_km: max_km.unwrap_or(self.settings.max_distance_km),
            ..self.settings
        };

        let result = store.list_trips().map(|trips| {
            let in_window = filter_by_window(trips, departure_time, settings.time_window);
            let considered = in_window.len();

            let mut matches = match_candidates(pickup, dropoff, in_window, &settings);
            rank_by_pickup_distance(&mut matches);

            debug!(
                considered,
                matched = matches.len(),
                max_km = settings.max_distance_km,
                "trip search finished"
            );
            matches
        });

        self.metrics
            .matching_latency_seconds
            .with_label_values(&["search"])
            .observe(start.elapsed().as_secs_f64());
        let outcome = match &result {
            Ok(matches) if matches.is_empty() => "empty",
            Ok(_) => "found",
            Err(_) => "error",
        };
        self.metrics
            .trip_searches_total
            .with_label_values(&[outcome])
            .inc();

        result
    }

    /// Matches every compatible searching request to `trip` in one store commit.
    ///
    /// There is no ranking or limit; how many requests a trip may absorb is decided
    /// solely by the seat policy. Requests deleted or claimed by another writer
    /// between the read and the commit are skipped.
    pub fn match_pending_requests<S: MatchStore + ?Sized>(
        &self,
        store: &S,
        trip: &Trip,
    ) -> Result<Vec<TripRequest>, AppError> {
        let start = Instant::now();
        let result = self.match_requests_inner(store, trip);

        self.metrics
            .matching_latency_seconds
            .with_label_values(&["match"])
            .observe(start.elapsed().as_secs_f64());
        if result.is_err() {
            self.metrics
                .request_matches_total
                .with_label_values(&["error"])
                .inc();
        }

        result
    }

    fn match_requests_inner<S: MatchStore + ?Sized>(
        &self,
        store: &S,
        trip: &Trip,
    ) -> Result<Vec<TripRequest>, AppError> {
        let requests = store.list_requests()?;
        let in_window = filter_by_window(
            requests,
            trip.scheduled_departure_time,
            self.settings.time_window,
        );
        let compatible = match_candidates(
            trip.pickup_point(),
            trip.dropoff_point(),
            in_window,
            &self.settings,
        );

        let mut staged = Vec::with_capacity(compatible.len());
        let mut distances = HashMap::with_capacity(compatible.len());
        let mut admitted_seats: u32 = 0;
        for found in &compatible {
            let request = &found.candidate;
            if !self.seat_policy.admits(trip, admitted_seats, request) {
                debug!(
                    trip_id = %trip.id,
                    request_id = %request.id,
                    admitted_seats,
                    "seat policy declined request"
                );
                self.metrics
                    .request_matches_total
                    .with_label_values(&["declined"])
                    .inc();
                continue;
            }

            admitted_seats = admitted_seats.saturating_add(request.passengers_count);
            staged.push(StagedMatch {
                request_id: request.id,
                expected_version: request.version,
            });
            distances.insert(
                request.id,
                (found.pickup_distance_km, found.dropoff_distance_km),
            );
        }

        if staged.is_empty() {
            debug!(trip_id = %trip.id, "no waiting requests match trip");
            return Ok(Vec::new());
        }

        let commit = match store.commit_matches(trip.id, &staged) {
            Ok(commit) => commit,
            Err(err) => {
                let staged_ids: Vec<Uuid> = staged.iter().map(|s| s.request_id).collect();
                error!(
                    trip_id = %trip.id,
                    staged = ?staged_ids,
                    error = %err,
                    "match commit failed; no requests were matched"
                );
                return Err(err);
            }
        };

        for request_id in &commit.stale {
            warn!(trip_id = %trip.id, request_id = %request_id, "skipping deleted request");
        }
        for request_id in &commit.conflicted {
            warn!(
                trip_id = %trip.id,
                request_id = %request_id,
                "skipping request changed by another writer"
            );
        }
        self.metrics
            .request_matches_total
            .with_label_values(&["skipped"])
            .inc_by((commit.stale.len() + commit.conflicted.len()) as u64);
        self.metrics
            .request_matches_total
            .with_label_values(&["matched"])
            .inc_by(commit.applied.len() as u64);

        let matched_at = Utc::now();
        for request in &commit.applied {
            let (pickup_distance_km, dropoff_distance_km) =
                distances.get(&request.id).copied().unwrap_or_default();
            let event = MatchEvent {
                id: Uuid::new_v4(),
                trip_id: trip.id,
                request_id: request.id,
                passenger_id: request.passenger_id,
                pickup_distance_km,
                dropoff_distance_km,
                matched_at,
            };
            // no subscribers is fine
            let _ = self.events_tx.send(event);
        }

        info!(
            trip_id = %trip.id,
            matched = commit.applied.len(),
            skipped = commit.stale.len() + commit.conflicted.len(),
            "matched waiting requests to trip"
        );

        Ok(commit.applied)
    }
}
