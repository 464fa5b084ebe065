//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, function
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `lambda_invocations_total` (counter): invocations by function, outcome
//! - `lambda_invocation_duration_seconds` (histogram): invoke call latency
//! - `lambda_fallback_responses_total` (counter): non-JSON payloads

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Invocation result label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    Success,
    FunctionError,
    Failed,
    Timeout,
}

impl InvocationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationOutcome::Success => "success",
            InvocationOutcome::FunctionError => "function_error",
            InvocationOutcome::Failed => "failed",
            InvocationOutcome::Timeout => "timeout",
        }
    }
}

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, function: &str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "function" => function.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "function" => function.to_string()
    )
    .record(elapsed);
}

pub fn record_invocation(function: &str, outcome: InvocationOutcome, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(
        "lambda_invocations_total",
        "function" => function.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    metrics::histogram!("lambda_invocation_duration_seconds", "function" => function.to_string())
        .record(elapsed);
}

pub fn record_fallback(function: &str) {
    metrics::counter!("lambda_fallback_responses_total", "function" => function.to_string())
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        assert_eq!(InvocationOutcome::Success.as_str(), "success");
        assert_eq!(InvocationOutcome::FunctionError.as_str(), "function_error");
    }

    #[test]
    fn recording_without_exporter_is_a_no_op() {
        let start = Instant::now();
        record_request("GET", 200, "fn", start);
        record_invocation("fn", InvocationOutcome::Timeout, start);
        record_fallback("fn");
    }
}
