use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::{Duration, Instant};

use crate::services::bio::BioSource;

/// Prometheus collectors for the service, registered on a private registry.
#[derive(Clone)]
pub struct MetricsService {
    registry: Registry,
    resumes_generated: IntCounter,
    bios_written: IntCounterVec,
    purchases: IntCounterVec,
    responses: IntCounterVec,
    request_duration: HistogramVec,
}

impl MetricsService {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("resumify".to_string()), None)?;

        let resumes_generated = IntCounter::new(
            "resumes_generated_total",
            "Resumes created through the generation workflow",
        )?;
        let bios_written = IntCounterVec::new(
            Opts::new("bios_written_total", "Bio texts produced, by source"),
            &["source"],
        )?;
        let purchases = IntCounterVec::new(
            Opts::new("purchases_total", "Recorded purchases, by kind"),
            &["kind"],
        )?;
        let responses = IntCounterVec::new(
            Opts::new("http_responses_total", "HTTP responses, by status class"),
            &["class"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency"),
            &["method"],
        )?;

        registry.register(Box::new(resumes_generated.clone()))?;
        registry.register(Box::new(bios_written.clone()))?;
        registry.register(Box::new(purchases.clone()))?;
        registry.register(Box::new(responses.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            resumes_generated,
            bios_written,
            purchases,
            responses,
            request_duration,
        })
    }

    pub fn record_generation(&self) {
        self.resumes_generated.inc();
    }

    pub fn record_bio(&self, source: BioSource) {
        self.bios_written.with_label_values(&[source.as_str()]).inc();
    }

    pub fn record_purchase(&self, kind: &str) {
        self.purchases.with_label_values(&[kind]).inc();
    }

    pub fn record_response(&self, method: &str, status: u16, duration: Duration) {
        let class = match status {
            500..=599 => "5xx",
            400..=499 => "4xx",
            300..=399 => "3xx",
            _ => "2xx",
        };
        self.responses.with_label_values(&[class]).inc();
        self.request_duration
            .with_label_values(&[method])
            .observe(duration.as_secs_f64());
    }

    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Measures the time since construction.
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_counters() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_generation();
        metrics.record_bio(BioSource::Fallback);
        metrics.record_purchase("tokens");
        metrics.record_response("GET", 404, Duration::from_millis(3));

        let text = metrics.render().unwrap();

        assert!(text.contains("resumify_resumes_generated_total 1"));
        assert!(text.contains("resumify_bios_written_total{source=\"fallback\"} 1"));
        assert!(text.contains("resumify_http_responses_total{class=\"4xx\"} 1"));
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let a = MetricsService::new().unwrap();
        let b = MetricsService::new().unwrap();
        a.record_generation();

        assert!(b.render().unwrap().contains("resumify_resumes_generated_total 0"));
    }
}
