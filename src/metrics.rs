use prometheus_client::{
    encoding::{EncodeLabelSet, text::encode},
    metrics::{counter::Counter, family::Family, gauge::Gauge, histogram::Histogram},
    registry::Registry,
};

// prometheus的默认latency buckets
const LATENCY_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

fn new_latency_histogram() -> Histogram {
    Histogram::new(LATENCY_BUCKETS.into_iter())
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpReqLabel {
    pub path: String,
    pub method: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TransactionLabel {
    pub path: String,
    pub method: String,
    pub status: String,
    pub payment_type: String,
}

/// All metrics of the demo services, backed by a single registry.
///
/// Constructed once at startup and passed to the routers through the shared
/// app state, so tests can scrape an isolated instance.
pub struct Metrics {
    registry: Registry,
    pub active_users: Gauge,
    pub http_requests: Family<HttpReqLabel, Counter>,
    pub http_request_duration: Family<HttpReqLabel, Histogram>,
    pub transaction_duration: Family<TransactionLabel, Histogram>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let active_users = Gauge::default();
        registry.register("active_users", "Number of active users", active_users.clone());
        let http_requests = Family::<HttpReqLabel, Counter>::default();
        // counter被prometheus-client暴露为http_requests_total
        registry.register("http_requests", "Total number of HTTP requests", http_requests.clone());
        let http_request_duration = Family::<HttpReqLabel, Histogram>::new_with_constructor(new_latency_histogram as fn() -> Histogram);
        registry.register("http_request_duration_seconds", "HTTP request duration in seconds", http_request_duration.clone());
        let transaction_duration = Family::<TransactionLabel, Histogram>::new_with_constructor(new_latency_histogram as fn() -> Histogram);
        registry.register(
            "http_request_transaction_duration_seconds",
            "Transaction request duration in seconds",
            transaction_duration.clone(),
        );
        Metrics {
            registry,
            active_users,
            http_requests,
            http_request_duration,
            transaction_duration,
        }
    }

    /// Render the whole registry in the exposition text format.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
