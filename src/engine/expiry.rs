use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::state::AppState;

/// Periodically expires searching requests whose window has closed.
pub async fn run_expiry_sweeper(state: Arc<AppState>, period: Duration) {
    info!(period_secs = period.as_secs(), "request expiry sweeper started");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match state.store.expire_requests(Utc::now()) {
            Ok(0) => {}
            Ok(expired) => info!(expired, "expired stale trip requests"),
            Err(err) => error!(error = %err, "request expiry sweep failed"),
        }
        state.refresh_gauges();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use tokio::time::Duration as TokioDuration;

    use super::run_expiry_sweeper;
    use crate::config::Config;
    use crate::models::trip_request::TripRequestStatus;
    use crate::state::AppState;
    use crate::test_support::request_at;

    #[tokio::test]
    async fn sweeper_expires_overdue_requests() {
        let state = Arc::new(AppState::new(&Config::default()));
        let mut overdue = request_at((24.7, 46.7), (24.6, 46.7), Utc::now() - Duration::hours(4));
        overdue.expires_at = Utc::now() - Duration::hours(2);
        let overdue = state.store.insert_request(overdue).unwrap();

        let task = tokio::spawn(run_expiry_sweeper(
            state.clone(),
            TokioDuration::from_millis(10),
        ));
        tokio::time::sleep(TokioDuration::from_millis(50)).await;
        task.abort();

        assert_eq!(
            state.store.get_request(overdue.id).unwrap().status,
            TripRequestStatus::Expired
        );
    }
}
