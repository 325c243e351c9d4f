use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static LISTING_QUERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "anketa_market_listing_queries_total",
        "Listing page queries by scope",
        &["scope"]
    )
    .expect("register listing_queries_total")
});

pub static GUARD_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "anketa_market_guard_rejections_total",
        "Operations rejected by the session guard",
        &["reason"]
    )
    .expect("register guard_rejections_total")
});

pub static LOGINS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "anketa_market_logins_total",
        "Successful logins"
    )
    .expect("register logins_total")
});

pub static LOGIN_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "anketa_market_login_failures_total",
        "Rejected login attempts"
    )
    .expect("register login_failures_total")
});

pub static STORE_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "anketa_market_store_errors_total",
        "Store failures surfaced as internal errors"
    )
    .expect("register store_errors_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_metrics_contain_touched_counters() {
        LOGINS_TOTAL.inc();
        GUARD_REJECTIONS_TOTAL.with_label_values(&["forbidden"]).inc();
        let (status, body) = encode_metrics();
        assert_eq!(status, axum::http::StatusCode::OK);
        assert!(body.contains("anketa_market_logins_total"));
        assert!(body.contains("anketa_market_guard_rejections_total"));
    }
}
