use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub garage_queries_total: IntCounterVec,
    pub garage_query_latency_seconds: HistogramVec,
    pub location_acquisitions_total: IntCounterVec,
    pub assistance_requests_total: IntCounterVec,
    pub assistance_requests_open: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let garage_queries_total = IntCounterVec::new(
            Opts::new("garage_queries_total", "Nearby garage queries by outcome"),
            &["outcome"],
        )
        .expect("valid garage_queries_total metric");

        let garage_query_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "garage_query_latency_seconds",
                "Latency of nearby garage queries in seconds",
            ),
            &["outcome"],
        )
        .expect("valid garage_query_latency_seconds metric");

        let location_acquisitions_total = IntCounterVec::new(
            Opts::new(
                "location_acquisitions_total",
                "Location acquisitions by fix quality or failure kind",
            ),
            &["outcome"],
        )
        .expect("valid location_acquisitions_total metric");

        let assistance_requests_total = IntCounterVec::new(
            Opts::new("assistance_requests_total", "Filed assistance requests by type"),
            &["request_type"],
        )
        .expect("valid assistance_requests_total metric");

        let assistance_requests_open = IntGauge::new(
            "assistance_requests_open",
            "Assistance requests that are pending or in progress",
        )
        .expect("valid assistance_requests_open metric");

        registry
            .register(Box::new(garage_queries_total.clone()))
            .expect("register garage_queries_total");
        registry
            .register(Box::new(garage_query_latency_seconds.clone()))
            .expect("register garage_query_latency_seconds");
        registry
            .register(Box::new(location_acquisitions_total.clone()))
            .expect("register location_acquisitions_total");
        registry
            .register(Box::new(assistance_requests_total.clone()))
            .expect("register assistance_requests_total");
        registry
            .register(Box::new(assistance_requests_open.clone()))
            .expect("register assistance_requests_open");

        Self {
            registry,
            garage_queries_total,
            garage_query_latency_seconds,
            location_acquisitions_total,
            assistance_requests_total,
            assistance_requests_open,
        }
    }

    pub fn observe_garage_query(&self, outcome: &str, elapsed_secs: f64) {
        self.garage_queries_total.with_label_values(&[outcome]).inc();
        self.garage_query_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed_secs);
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
