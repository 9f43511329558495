use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub trip_searches_total: IntCounterVec,
    pub request_matches_total: IntCounterVec,
    pub matching_latency_seconds: HistogramVec,
    pub open_trips: IntGauge,
    pub searching_requests: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let trip_searches_total = IntCounterVec::new(
            Opts::new("trip_searches_total", "Trip searches by outcome"),
            &["outcome"],
        )
        .expect("valid trip_searches_total metric");

        let request_matches_total = IntCounterVec::new(
            Opts::new(
                "request_matches_total",
                "Trip requests considered for matching, by outcome",
            ),
            &["outcome"],
        )
        .expect("valid request_matches_total metric");

        let matching_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "matching_latency_seconds",
                "Latency of the matching entry points in seconds",
            ),
            &["operation"],
        )
        .expect("valid matching_latency_seconds metric");

        let open_trips = IntGauge::new("open_trips", "Scheduled trips with free seats")
            .expect("valid open_trips metric");

        let searching_requests =
            IntGauge::new("searching_requests", "Trip requests still searching")
                .expect("valid searching_requests metric");

        registry
            .register(Box::new(trip_searches_total.clone()))
            .expect("register trip_searches_total");
        registry
            .register(Box::new(request_matches_total.clone()))
            .expect("register request_matches_total");
        registry
            .register(Box::new(matching_latency_seconds.clone()))
            .expect("register matching_latency_seconds");
        registry
            .register(Box::new(open_trips.clone()))
            .expect("register open_trips");
        registry
            .register(Box::new(searching_requests.clone()))
            .expect("register searching_requests");

        Self {
            registry,
            trip_searches_total,
            request_matches_total,
            matching_latency_seconds,
            open_trips,
            searching_requests,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
