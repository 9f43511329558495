pub mod memory;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::Booking;
use crate::models::trip::Trip;
use crate::models::trip_request::TripRequest;

pub use memory::MemoryStore;

/// A request the matcher wants to move to `matched`, pinned to the version it read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedMatch {
    pub request_id: Uuid,
    pub expected_version: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MatchCommit {
    /// Requests now matched, in staging order.
    pub applied: Vec<TripRequest>,
    /// Staged requests that no longer exist.
    pub stale: Vec<Uuid>,
    /// Staged requests another writer changed first.
    pub conflicted: Vec<Uuid>,
}

/// The part of persistence the matching core reads and writes.
pub trait MatchStore: Send + Sync {
    fn list_trips(&self) -> Result<Vec<Trip>, AppError>;

    fn list_requests(&self) -> Result<Vec<TripRequest>, AppError>;

    /// Applies every still-valid staged match or none of them.
    ///
    /// A staged request that was deleted lands in `stale`, one whose version or status
    /// moved on lands in `conflicted`; neither prevents the others from being applied.
    /// An `Err` means nothing was written.
    fn commit_matches(
        &self,
        trip_id: Uuid,
        staged: &[StagedMatch],
    ) -> Result<MatchCommit, AppError>;
}

pub type TripMutation<'a> = &'a mut dyn FnMut(&mut Trip) -> Result<(), AppError>;
pub type RequestMutation<'a> = &'a mut dyn FnMut(&mut TripRequest) -> Result<(), AppError>;

pub trait RideStore: MatchStore {
    fn insert_trip(&self, trip: Trip) -> Result<Trip, AppError>;

    fn get_trip(&self, id: Uuid) -> Result<Trip, AppError>;

    /// Runs `mutate` on a copy of the trip and stores it only if it returns `Ok`.
    fn update_trip(&self, id: Uuid, mutate: TripMutation<'_>) -> Result<Trip, AppError>;

    fn insert_request(&self, request: TripRequest) -> Result<TripRequest, AppError>;

    fn get_request(&self, id: Uuid) -> Result<TripRequest, AppError>;

    /// Compare-and-swap on `version`; a mismatch is a conflict.
    fn transition_request(
        &self,
        id: Uuid,
        expected_version: u64,
        mutate: RequestMutation<'_>,
    ) -> Result<TripRequest, AppError>;

    fn delete_request(&self, id: Uuid) -> Result<TripRequest, AppError>;

    /// Marks searching requests past `expires_at` as expired, returning how many moved.
    fn expire_requests(&self, now: DateTime<Utc>) -> Result<usize, AppError>;

    fn insert_booking(&self, booking: Booking) -> Result<Booking, AppError>;

    fn get_booking(&self, id: Uuid) -> Result<Booking, AppError>;

    fn list_bookings_for_trip(&self, trip_id: Uuid) -> Result<Vec<Booking>, AppError>;

    /// Accepts a pending booking, taking its seats from the trip and accepting the
    /// request it came from, all at once.
    fn accept_booking(&self, id: Uuid, now: DateTime<Utc>) -> Result<Booking, AppError>;

    fn reject_booking(&self, id: Uuid) -> Result<Booking, AppError>;

    fn counts(&self) -> StoreCounts;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub trips: usize,
    pub requests: usize,
    pub bookings: usize,
    pub open_trips: usize,
    pub searching_requests: usize,
}
