use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::trip::Trip;
use crate::models::trip_request::{TripRequest, TripRequestStatus};
use crate::store::{
    MatchCommit, MatchStore, RequestMutation, RideStore, StagedMatch, StoreCounts, TripMutation,
};

/// In-process tables. Reads go straight to the maps; every write takes `write_lock`
/// so multi-row changes are applied as a unit.
#[derive(Default)]
pub struct MemoryStore {
    trips: DashMap<Uuid, Trip>,
    requests: DashMap<Uuid, TripRequest>,
    bookings: DashMap<Uuid, Booking>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, AppError> {
        self.write_lock
            .lock()
            .map_err(|_| AppError::Internal("store write lock poisoned".to_string()))
    }

    fn trip(&self, id: Uuid) -> Result<Trip, AppError> {
        self.trips
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("trip {id} not found")))
    }

    fn request(&self, id: Uuid) -> Result<TripRequest, AppError> {
        self.requests
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("trip request {id} not found")))
    }

    fn booking(&self, id: Uuid) -> Result<Booking, AppError> {
        self.bookings
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("booking {id} not found")))
    }
}

impl MatchStore for MemoryStore {
    fn list_trips(&self) -> Result<Vec<Trip>, AppError> {
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(trips)
    }

    fn list_requests(&self) -> Result<Vec<TripRequest>, AppError> {
        let mut requests: Vec<TripRequest> = self
            .requests
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(requests)
    }

    fn commit_matches(
        &self,
        trip_id: Uuid,
        staged: &[StagedMatch],
    ) -> Result<MatchCommit, AppError> {
        let _guard = self.lock()?;

        if !self.trips.contains_key(&trip_id) {
            return Err(AppError::NotFound(format!("trip {trip_id} not found")));
        }

        let mut commit = MatchCommit::default();
        for entry in staged {
            let Some(current) = self.requests.get(&entry.request_id).map(|r| r.value().clone())
            else {
                commit.stale.push(entry.request_id);
                continue;
            };

            if current.version != entry.expected_version || !current.is_searching() {
                commit.conflicted.push(entry.request_id);
                continue;
            }

            let mut updated = current;
            updated.status = TripRequestStatus::Matched;
            updated.matched_trip = Some(trip_id);
            updated.version += 1;
            commit.applied.push(updated);
        }

        for request in &commit.applied {
            self.requests.insert(request.id, request.clone());
        }

        debug!(
            trip_id = %trip_id,
            applied = commit.applied.len(),
            stale = commit.stale.len(),
            conflicted = commit.conflicted.len(),
            "match batch committed"
        );

        Ok(commit)
    }
}

impl RideStore for MemoryStore {
    fn insert_trip(&self, trip: Trip) -> Result<Trip, AppError> {
        let _guard = self.lock()?;
        if self.trips.contains_key(&trip.id) {
            return Err(AppError::Conflict(format!("trip {} already exists", trip.id)));
        }
        self.trips.insert(trip.id, trip.clone());
        Ok(trip)
    }

    fn get_trip(&self, id: Uuid) -> Result<Trip, AppError> {
        self.trip(id)
    }

    fn update_trip(&self, id: Uuid, mutate: TripMutation<'_>) -> Result<Trip, AppError> {
        let _guard = self.lock()?;
        let mut trip = self.trip(id)?;
        mutate(&mut trip)?;
        self.trips.insert(id, trip.clone());
        Ok(trip)
    }

    fn insert_request(&self, request: TripRequest) -> Result<TripRequest, AppError> {
        let _guard = self.lock()?;
        if self.requests.contains_key(&request.id) {
            return Err(AppError::Conflict(format!(
                "trip request {} already exists",
                request.id
            )));
        }
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    fn get_request(&self, id: Uuid) -> Result<TripRequest, AppError> {
        self.request(id)
    }

    fn transition_request(
        &self,
        id: Uuid,
        expected_version: u64,
        mutate: RequestMutation<'_>,
    ) -> Result<TripRequest, AppError> {
        let _guard = self.lock()?;
        let mut request = self.request(id)?;
        if request.version != expected_version {
            return Err(AppError::Conflict(format!(
                "trip request {id} changed (version {} != {expected_version})",
                request.version
            )));
        }

        mutate(&mut request)?;
        request.version += 1;
        self.requests.insert(id, request.clone());
        Ok(request)
    }

    fn delete_request(&self, id: Uuid) -> Result<TripRequest, AppError> {
        let _guard = self.lock()?;
        self.requests
            .remove(&id)
            .map(|(_, request)| request)
            .ok_or_else(|| AppError::NotFound(format!("trip request {id} not found")))
    }

    fn expire_requests(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let _guard = self.lock()?;
        let mut expired = 0;
        for mut entry in self.requests.iter_mut() {
            let request = entry.value_mut();
            if request.is_overdue(now) {
                request.status = TripRequestStatus::Expired;
                request.version += 1;
                expired += 1;
            }
        }
        Ok(expired)
    }

    fn insert_booking(&self, booking: Booking) -> Result<Booking, AppError> {
        let _guard = self.lock()?;
        self.trip(booking.trip_id)?;

        let duplicate = self.bookings.iter().any(|entry| {
            let existing = entry.value();
            existing.trip_id == booking.trip_id
                && existing.passenger_id == booking.passenger_id
                && existing.status != BookingStatus::Cancelled
                && existing.status != BookingStatus::Rejected
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "passenger {} already has a booking on trip {}",
                booking.passenger_id, booking.trip_id
            )));
        }

        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    fn get_booking(&self, id: Uuid) -> Result<Booking, AppError> {
        self.booking(id)
    }

    fn list_bookings_for_trip(&self, trip_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| entry.value().trip_id == trip_id)
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by(|a, b| a.requested_at.cmp(&b.requested_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }

    fn accept_booking(&self, id: Uuid, now: DateTime<Utc>) -> Result<Booking, AppError> {
        let _guard = self.lock()?;

        let mut booking = self.booking(id)?;
        if booking.status != BookingStatus::Pending {
            return Err(AppError::Conflict(format!(
                "booking {id} is {:?}, only pending bookings can be accepted",
                booking.status
            )));
        }

        let mut trip = self.trip(booking.trip_id)?;
        trip.reserve_seats(booking.seats_requested, now)?;

        let linked_request = match booking.request_id {
            Some(request_id) => {
                let mut request = self.request(request_id)?;
                match request.status {
                    TripRequestStatus::Matched
                        if request.matched_trip.is_some_and(|matched| matched != trip.id) =>
                    {
                        return Err(AppError::Conflict(format!(
                            "trip request {request_id} is matched to another trip"
                        )));
                    }
                    TripRequestStatus::Searching | TripRequestStatus::Matched => {
                        request.status = TripRequestStatus::Accepted;
                        request.matched_trip = Some(trip.id);
                        request.version += 1;
                        Some(request)
                    }
                    other => {
                        return Err(AppError::Conflict(format!(
                            "trip request {request_id} is {other:?} and cannot be accepted"
                        )));
                    }
                }
            }
            None => None,
        };

        booking.status = BookingStatus::Accepted;
        booking.accepted_at = Some(now);

        self.trips.insert(trip.id, trip);
        if let Some(request) = linked_request {
            self.requests.insert(request.id, request);
        }
        self.bookings.insert(booking.id, booking.clone());

        Ok(booking)
    }

    fn reject_booking(&self, id: Uuid) -> Result<Booking, AppError> {
        let _guard = self.lock()?;

        let mut booking = self.booking(id)?;
        if booking.status != BookingStatus::Pending {
            return Err(AppError::Conflict(format!(
                "booking {id} is {:?}, only pending bookings can be rejected",
                booking.status
            )));
        }

        booking.status = BookingStatus::Rejected;
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    fn counts(&self) -> StoreCounts {
        StoreCounts {
            trips: self.trips.len(),
            requests: self.requests.len(),
            bookings: self.bookings.len(),
            open_trips: self.trips.iter().filter(|e| e.value().is_bookable()).count(),
            searching_requests: self
                .requests
                .iter()
                .filter(|e| e.value().is_searching())
                .count(),
        }
    }
}
