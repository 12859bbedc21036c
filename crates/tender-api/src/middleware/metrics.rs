//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware. Domain-level gauges (opportunities and proposals by
//! status) are updated on each `/metrics` scrape (pull model) — see the
//! metrics handler in `lib.rs`. The closing hook pushes its run counters
//! directly.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    Encoder, GaugeVec, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // -- HTTP middleware metrics (push model) --
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    // -- Domain gauges (pull model, updated on /metrics scrape) --
    opportunities_total: GaugeVec,
    proposals_total: GaugeVec,

    // -- Closing hook counters (push model) --
    closing_runs_total: IntCounter,
    closing_throttled_total: IntCounter,
    opportunities_closed_total: IntCounter,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics").finish_non_exhaustive()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("tender_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "tender_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new(
                "tender_http_errors_total",
                "Total HTTP errors (4xx and 5xx)",
            ),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let opportunities_total = GaugeVec::new(
            Opts::new("tender_opportunities_total", "Opportunities by status"),
            &["status"],
        )
        .expect("metric can be created");

        let proposals_total = GaugeVec::new(
            Opts::new("tender_proposals_total", "Proposals by status"),
            &["status"],
        )
        .expect("metric can be created");

        let closing_runs_total = IntCounter::new(
            "tender_closing_runs_total",
            "Closing hook scans actually performed",
        )
        .expect("metric can be created");

        let closing_throttled_total = IntCounter::new(
            "tender_closing_throttled_total",
            "Closing hook invocations coalesced by the debounce",
        )
        .expect("metric can be created");

        let opportunities_closed_total = IntCounter::new(
            "tender_opportunities_closed_total",
            "Opportunities moved to evaluation by the closing hook",
        )
        .expect("metric can be created");

        for metric in [
            Box::new(http_requests_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(http_request_duration_seconds.clone()),
            Box::new(http_errors_total.clone()),
            Box::new(opportunities_total.clone()),
            Box::new(proposals_total.clone()),
            Box::new(closing_runs_total.clone()),
            Box::new(closing_throttled_total.clone()),
            Box::new(opportunities_closed_total.clone()),
        ] {
            registry
                .register(metric)
                .expect("metric can be registered");
        }

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                opportunities_total,
                proposals_total,
                closing_runs_total,
                closing_throttled_total,
                opportunities_closed_total,
            }),
        }
    }

    /// Opportunities-by-status gauge.
    pub fn opportunities_total(&self) -> &GaugeVec {
        &self.inner.opportunities_total
    }

    /// Proposals-by-status gauge.
    pub fn proposals_total(&self) -> &GaugeVec {
        &self.inner.proposals_total
    }

    /// Count one performed closing scan.
    pub fn record_closing_run(&self, closed: usize) {
        self.inner.closing_runs_total.inc();
        self.inner.opportunities_closed_total.inc_by(closed as u64);
    }

    /// Count one throttled (coalesced) closing invocation.
    pub fn record_closing_throttled(&self) {
        self.inner.closing_throttled_total.inc();
    }

    /// Record one completed HTTP request.
    pub fn record_request(&self, method: &str, path: &str, status: u16, elapsed_secs: f64) {
        let status = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status])
            .inc();
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(elapsed_secs);
        if status.starts_with('4') || status.starts_with('5') {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status])
                .inc();
        }
    }

    /// Gather and encode all metrics in Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buf = Vec::new();
        encoder
            .encode(&families, &mut buf)
            .map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Axum middleware recording request counts and latency. The metrics
/// handle arrives through request extensions (layered in `app()`).
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let metrics = req.extensions().get::<ApiMetrics>().cloned();
    let method = req.method().to_string();
    // Use the matched route template, not the raw path, to bound label
    // cardinality.
    let path = req
        .extensions()
        .get::<axum::extract::MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(req).await;

    if let Some(metrics) = metrics {
        metrics.record_request(
            &method,
            &path,
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }
    response
}
