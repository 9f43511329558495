use std::fmt;
use std::str::FromStr;

use crate::models::trip::Trip;
use crate::models::trip_request::TripRequest;

/// Decides whether one more compatible request may be matched against a trip.
///
/// `admitted_seats` is the passenger total already admitted earlier in the same
/// matching pass.
pub trait SeatPolicy: Send + Sync {
    fn admits(&self, trip: &Trip, admitted_seats: u32, request: &TripRequest) -> bool;
}

/// Admits every compatible request. Several requests can end up matched to a trip
/// whose seats cannot hold them all; seats are only enforced when a booking is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnboundedSeats;

impl SeatPolicy for UnboundedSeats {
    fn admits(&self, _trip: &Trip, _admitted_seats: u32, _request: &TripRequest) -> bool {
        true
    }
}

/// Admits requests while their passengers still fit into the trip's free seats.
#[derive(Debug, Default, Clone, Copy)]
pub struct CumulativeSeats;

impl SeatPolicy for CumulativeSeats {
    fn admits(&self, trip: &Trip, admitted_seats: u32, request: &TripRequest) -> bool {
        admitted_seats
            .checked_add(request.passengers_count)
            .is_some_and(|total| total <= trip.available_seats)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatPolicyKind {
    Unbounded,
    Cumulative,
}

impl SeatPolicyKind {
    pub fn build(self) -> Box<dyn SeatPolicy> {
        match self {
            SeatPolicyKind::Unbounded => Box::new(UnboundedSeats),
            SeatPolicyKind::Cumulative => Box::new(CumulativeSeats),
        }
    }
}

impl FromStr for SeatPolicyKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "unbounded" => Ok(SeatPolicyKind::Unbounded),
            "cumulative" => Ok(SeatPolicyKind::Cumulative),
            other => Err(format!("unknown seat policy {other}, expected unbounded or cumulative")),
        }
    }
}

impl fmt::Display for SeatPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeatPolicyKind::Unbounded => f.write_str("unbounded"),
            SeatPolicyKind::Cumulative => f.write_str("cumulative"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{CumulativeSeats, SeatPolicy, SeatPolicyKind, UnboundedSeats};
    use crate::test_support::{request_at, trip_at};

    #[test]
    fn unbounded_admits_beyond_capacity() {
        let now = Utc::now();
        let mut trip = trip_at((24.7, 46.7), (24.6, 46.7), now);
        trip.available_seats = 1;
        let mut request = request_at((24.7, 46.7), (24.6, 46.7), now);
        request.passengers_count = 4;

        assert!(UnboundedSeats.admits(&trip, 10, &request));
    }

    #[test]
    fn cumulative_stops_at_free_seats() {
        let now = Utc::now();
        let mut trip = trip_at((24.7, 46.7), (24.6, 46.7), now);
        trip.available_seats = 3;
        let mut pair = request_at((24.7, 46.7), (24.6, 46.7), now);
        pair.passengers_count = 2;

        assert!(CumulativeSeats.admits(&trip, 0, &pair));
        assert!(CumulativeSeats.admits(&trip, 1, &pair));
        assert!(!CumulativeSeats.admits(&trip, 2, &pair));
        assert!(!CumulativeSeats.admits(&trip, u32::MAX, &pair));
    }

    #[test]
    fn policy_kind_parses_case_insensitively() {
        assert_eq!("Cumulative".parse::<SeatPolicyKind>(), Ok(SeatPolicyKind::Cumulative));
        assert_eq!(" unbounded ".parse::<SeatPolicyKind>(), Ok(SeatPolicyKind::Unbounded));
        assert!("strict".parse::<SeatPolicyKind>().is_err());
    }
}
