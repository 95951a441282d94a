// HTTP Metrics
// Prometheus counters and latency histograms keyed by method/route/status,
// exposed in text form through the `/metrics` endpoint.

use std::sync::OnceLock;
use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

static REGISTRY: OnceLock<Registry> = OnceLock::new();
static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

fn register_collector<T>(collector: T) -> T
where
    T: prometheus::core::Collector + Clone + 'static,
{
    let _ = registry().register(Box::new(collector.clone()));
    collector
}

fn http_requests_total() -> &'static IntCounterVec {
    HTTP_REQUESTS_TOTAL.get_or_init(|| {
        register_collector(
            IntCounterVec::new(
                Opts::new("devplan_http_requests_total", "HTTP request count."),
                &["method", "route", "status"],
            )
            .expect("create devplan_http_requests_total"),
        )
    })
}

fn http_request_duration_seconds() -> &'static HistogramVec {
    HTTP_REQUEST_DURATION_SECONDS.get_or_init(|| {
        register_collector(
            HistogramVec::new(
                HistogramOpts::new(
                    "devplan_http_request_duration_seconds",
                    "HTTP request duration in seconds.",
                )
                .buckets(vec![
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
                ]),
                &["method", "route"],
            )
            .expect("create devplan_http_request_duration_seconds"),
        )
    })
}

/// Record one completed request.
pub fn observe_request(method: &str, route: &str, status: u16, elapsed: Duration) {
    http_requests_total()
        .with_label_values(&[method, route, &status.to_string()])
        .inc();
    http_request_duration_seconds()
        .with_label_values(&[method, route])
        .observe(elapsed.as_secs_f64());
}

/// Render the registry in Prometheus text exposition format.
pub fn render() -> String {
    // Touch the vecs so the families exist even before the first request.
    let _ = http_requests_total();
    let _ = http_request_duration_seconds();

    let metric_families = registry().gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_then_render() {
        observe_request("POST", "/v1/projects", 201, Duration::from_millis(3));
        observe_request("GET", "/v1/projects/:id", 404, Duration::from_millis(1));

        let text = render();
        assert!(text.contains("devplan_http_requests_total"));
        assert!(text.contains("devplan_http_request_duration_seconds"));
        assert!(text.contains("/v1/projects"));
    }
}
