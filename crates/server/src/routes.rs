use axum::{
    extract::State,
    response::Response,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;

use common::types::Health;
use service::DocumentService;

use crate::observability;

pub mod cache;

/// Shared handler state; the document service owns the injected store.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentService,
}

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health::ok(state.documents.len()))
}

pub async fn metrics() -> Response {
    observability::render_metrics()
}

/// Build the full application router: cache CRUD, health and metrics.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    observability::init_metrics();

    let cache_routes = Router::new().route(
        "/cache/:key",
        get(cache::read_entry)
            .post(cache::create_entry)
            .put(cache::replace_entry)
            .patch(cache::patch_entry)
            .delete(cache::delete_entry),
    );

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(cache_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use configs::StoreConfig;
    use service::InMemoryStore;
    use tower::ServiceExt;

    fn app() -> Router {
        let documents = DocumentService::new(Arc::new(InMemoryStore::new()), &StoreConfig::default());
        build_router(AppState { documents }, CorsLayer::very_permissive())
    }

    #[tokio::test]
    async fn health_reports_entry_count() -> anyhow::Result<()> {
        let res = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty())?)
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await?;
        let health: Health = serde_json::from_slice(&body)?;
        assert_eq!(health, Health::ok(0));
        Ok(())
    }

    #[tokio::test]
    async fn blank_key_is_a_validation_error() -> anyhow::Result<()> {
        let res = app()
            .oneshot(Request::builder().method("POST").uri("/cache/%20%20").body(Body::from("{}"))?)
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await?)?;
        assert_eq!(body["error"], "Validation Error");
        assert_eq!(body["message"], "key must not be blank");
        Ok(())
    }

    #[tokio::test]
    async fn metrics_exposes_operation_counters() -> anyhow::Result<()> {
        let app = app();
        app.clone()
            .oneshot(Request::builder().uri("/cache/absent").body(Body::empty())?)
            .await?;
        let res = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty())?)
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let text = String::from_utf8(to_bytes(res.into_body(), usize::MAX).await?.to_vec())?;
        assert!(text.contains("doc_cache_operations_total"));
        assert!(text.contains(r#"outcome="not_found""#));
        Ok(())
    }
}
