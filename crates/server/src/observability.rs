use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};
use service::errors::ServiceError;

// Prometheus metrics (default registry)
pub static OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "doc_cache_operations_total",
        "Document operations by kind and outcome",
        &["op", "outcome"]
    )
    .expect("register operations_total")
});

pub static PATCH_FALLBACK_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "doc_cache_patch_fallback_total",
        "Patches that replaced the value instead of merging"
    )
    .expect("register patch_fallback_total")
});

/// Register all metrics up front so `/metrics` lists them before the first request.
pub fn init_metrics() {
    Lazy::force(&OPERATIONS_TOTAL);
    Lazy::force(&PATCH_FALLBACK_TOTAL);
}

fn outcome_label<T>(res: &Result<T, ServiceError>) -> &'static str {
    match res {
        Ok(_) => "ok",
        Err(ServiceError::Validation(_)) => "invalid",
        Err(ServiceError::NotFound(_)) => "not_found",
        Err(ServiceError::Conflict(_)) => "conflict",
    }
}

/// Count one operation under its outcome.
pub fn record<T>(op: &str, res: &Result<T, ServiceError>) {
    OPERATIONS_TOTAL.with_label_values(&[op, outcome_label(res)]).inc();
}

/// Render the default registry in Prometheus text format.
pub fn render_metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("encode metrics: {e}")).into_response();
    }
    match String::from_utf8(buffer) {
        Ok(body) => ([(header::CONTENT_TYPE, encoder.format_type().to_string())], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics not utf-8: {e}")).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_by_outcome() {
        let before = OPERATIONS_TOTAL.with_label_values(&["test_op", "conflict"]).get();
        record::<()>("test_op", &Err(ServiceError::conflict("k")));
        let after = OPERATIONS_TOTAL.with_label_values(&["test_op", "conflict"]).get();
        assert_eq!(after, before + 1);
    }
}
