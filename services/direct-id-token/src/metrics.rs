//! Prometheus metrics for the Direct ID token service.

use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, Encoder, HistogramVec, TextEncoder, register_counter_vec, register_histogram_vec,
};

/// Tokens issued counter.
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "direct_id_tokens_issued_total",
        "Total number of Direct ID tokens issued",
        &["profile", "algorithm"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Failed issuance counter.
pub static ISSUANCE_FAILURES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "direct_id_issuance_failures_total",
        "Total number of rejected or failed token requests",
        &["error_code"]
    )
    .expect("Failed to register issuance_failures metric")
});

/// Claim construction plus signing latency.
pub static ISSUANCE_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "direct_id_issuance_latency_seconds",
        "Token signing latency in seconds",
        &["algorithm"],
        vec![0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .expect("Failed to register issuance_latency metric")
});

/// Record a token issuance.
pub fn record_token_issued(profile: &str, algorithm: &str) {
    TOKENS_ISSUED.with_label_values(&[profile, algorithm]).inc();
}

/// Record a failed request.
pub fn record_issuance_failure(error_code: &str) {
    ISSUANCE_FAILURES.with_label_values(&[error_code]).inc();
}

/// Record signing latency.
pub fn record_issuance_latency(algorithm: &str, duration_secs: f64) {
    ISSUANCE_LATENCY
        .with_label_values(&[algorithm])
        .observe(duration_secs);
}

/// Render the default registry in the Prometheus text format.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_token_issued() {
        record_token_issued("visitor", "ES256");
        let value = TOKENS_ISSUED.with_label_values(&["visitor", "ES256"]).get();
        assert!(value > 0.0);
    }

    #[test]
    fn test_record_issuance_failure() {
        record_issuance_failure("VISITOR_ID_REQUIRED");
        let value = ISSUANCE_FAILURES
            .with_label_values(&["VISITOR_ID_REQUIRED"])
            .get();
        assert!(value > 0.0);
    }

    #[test]
    fn test_render_includes_recorded_metrics() {
        record_issuance_latency("RS256", 0.002);
        record_token_issued("mock", "RS256");

        let text = render().unwrap();
        assert!(text.contains("direct_id_tokens_issued_total"));
        assert!(text.contains("direct_id_issuance_latency_seconds"));
    }
}
