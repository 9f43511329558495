use chrono::{DateTime, Duration, Utc};

use crate::models::trip::Trip;
use crate::models::trip_request::TripRequest;

/// Something with a departure time that may or may not still be open for matching.
pub trait WindowCandidate {
    fn departure_time(&self) -> DateTime<Utc>;
    fn is_open(&self) -> bool;
}

impl WindowCandidate for Trip {
    fn departure_time(&self) -> DateTime<Utc> {
        self.scheduled_departure_time
    }

    fn is_open(&self) -> bool {
        self.is_bookable()
    }
}

impl WindowCandidate for TripRequest {
    fn departure_time(&self) -> DateTime<Utc> {
        self.requested_departure_time
    }

    fn is_open(&self) -> bool {
        self.is_searching()
    }
}

impl<T: WindowCandidate + ?Sized> WindowCandidate for &T {
    fn departure_time(&self) -> DateTime<Utc> {
        (**self).departure_time()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// Inclusive on both ends. A bound that falls outside chrono's range leaves that side open.
pub fn within_window(departure: DateTime<Utc>, target: DateTime<Utc>, window: Duration) -> bool {
    let after_start = target
        .checked_sub_signed(window)
        .is_none_or(|start| departure >= start);
    let before_end = target
        .checked_add_signed(window)
        .is_none_or(|end| departure <= end);
    after_start && before_end
}

/// Keeps open candidates departing in `[target - window, target + window]`, in input order.
pub fn filter_by_window<T, I>(candidates: I, target: DateTime<Utc>, window: Duration) -> Vec<T>
where
    T: WindowCandidate,
    I: IntoIterator<Item = T>,
{
    candidates
        .into_iter()
        .filter(|candidate| {
            candidate.is_open() && within_window(candidate.departure_time(), target, window)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{filter_by_window, within_window};
    use crate::models::trip::TripStatus;
    use crate::models::trip_request::TripRequestStatus;
    use crate::test_support::{request_at, trip_at};

    const PICKUP: (f64, f64) = (24.7140, 46.6760);
    const DROPOFF: (f64, f64) = (24.6880, 46.7225);

    #[test]
    fn window_bounds_are_inclusive() {
        let target = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let window = Duration::hours(2);

        assert!(within_window(target - window, target, window));
        assert!(within_window(target + window, target, window));
        assert!(!within_window(target + window + Duration::seconds(1), target, window));
        assert!(!within_window(target - window - Duration::seconds(1), target, window));
    }

    #[test]
    fn bounds_past_the_calendar_limit_stay_open() {
        let window = Duration::hours(2);

        assert!(within_window(DateTime::<Utc>::MAX_UTC, DateTime::<Utc>::MAX_UTC, window));
        assert!(within_window(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MIN_UTC, window));
        assert!(!within_window(
            DateTime::<Utc>::MAX_UTC - Duration::hours(3),
            DateTime::<Utc>::MAX_UTC,
            window
        ));

        let target = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        assert!(within_window(target, target, Duration::MAX));
        assert!(within_window(DateTime::<Utc>::MIN_UTC, target, Duration::MAX));
    }

    #[test]
    fn trips_outside_window_are_dropped_and_order_is_kept() {
        let target = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let early = trip_at(PICKUP, DROPOFF, target - Duration::minutes(90));
        let too_late = trip_at(PICKUP, DROPOFF, target + Duration::minutes(121));
        let on_time = trip_at(PICKUP, DROPOFF, target);
        let expected = vec![early.id, on_time.id];

        let kept = filter_by_window(vec![early, too_late, on_time], target, Duration::hours(2));

        assert_eq!(kept.iter().map(|t| t.id).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn full_or_unscheduled_trips_are_not_candidates() {
        let target = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

        let mut full = trip_at(PICKUP, DROPOFF, target);
        full.available_seats = 0;
        let mut pending = trip_at(PICKUP, DROPOFF, target);
        pending.status = TripStatus::Pending;
        let mut active = trip_at(PICKUP, DROPOFF, target);
        active.status = TripStatus::Active;

        let kept = filter_by_window(vec![full, pending, active], target, Duration::hours(2));
        assert!(kept.is_empty());
    }

    #[test]
    fn only_searching_requests_are_candidates() {
        let target = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

        let searching = request_at(PICKUP, DROPOFF, target);
        let mut matched = request_at(PICKUP, DROPOFF, target);
        matched.status = TripRequestStatus::Matched;
        let mut cancelled = request_at(PICKUP, DROPOFF, target);
        cancelled.status = TripRequestStatus::Cancelled;
        let searching_id = searching.id;

        let kept = filter_by_window(vec![matched, searching, cancelled], target, Duration::hours(2));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, searching_id);
    }

    #[test]
    fn filter_works_over_borrowed_candidates() {
        let target = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let trips = vec![trip_at(PICKUP, DROPOFF, target)];

        let kept = filter_by_window(trips.iter(), target, Duration::zero());
        assert_eq!(kept.len(), 1);
    }
}
