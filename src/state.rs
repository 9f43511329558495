use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::engine::orchestrator::MatchOrchestrator;
use crate::geo::ServiceRegion;
use crate::observability::metrics::Metrics;
use crate::store::{MemoryStore, RideStore};

pub struct AppState {
    pub store: Arc<dyn RideStore>,
    pub matcher: MatchOrchestrator,
    pub region: ServiceRegion,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: &Config, store: Arc<dyn RideStore>) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size.max(1));
        let metrics = Metrics::new();
        let matcher = MatchOrchestrator::new(
            config.match_settings(),
            config.seat_policy.build(),
            metrics.clone(),
            events_tx,
        );

        Self {
            store,
            matcher,
            region: config.region,
            metrics,
        }
    }

    /// Refreshes the gauges that mirror store contents.
    pub fn refresh_gauges(&self) {
        let counts = self.store.counts();
        self.metrics.open_trips.set(counts.open_trips as i64);
        self.metrics
            .searching_requests
            .set(counts.searching_requests as i64);
    }
}
