use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use service::MergeOutcome;

use crate::errors::JsonApiError;
use crate::observability::{self, PATCH_FALLBACK_TOTAL};
use crate::routes::AppState;

/// 创建（键已存在时返回 409）
pub async fn create_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: String,
) -> Result<StatusCode, JsonApiError> {
    let res = state.documents.create(&key, body);
    observability::record("create", &res);
    res?;
    Ok(StatusCode::CREATED)
}

/// Stored values that parse as JSON are returned as JSON; anything else as plain text.
pub async fn read_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, JsonApiError> {
    let res = state.documents.read(&key);
    observability::record("read", &res);
    let value = res?;
    Ok(match serde_json::from_str::<Value>(&value) {
        Ok(doc) => Json(doc).into_response(),
        Err(_) => value.into_response(),
    })
}

/// 替换（upsert）
pub async fn replace_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: String,
) -> Result<StatusCode, JsonApiError> {
    let res = state.documents.replace(&key, body);
    observability::record("replace", &res);
    res?;
    Ok(StatusCode::OK)
}

pub async fn patch_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: String,
) -> Result<Response, JsonApiError> {
    let res = state.documents.patch(&key, &body);
    observability::record("patch", &res);
    let outcome = res?;
    if !outcome.is_merged() {
        PATCH_FALLBACK_TOTAL.inc();
    }
    Ok(match outcome {
        MergeOutcome::Merged(doc) | MergeOutcome::Replaced { value: doc, .. } => Json(doc).into_response(),
        MergeOutcome::Unparsable(text) => text.into_response(),
    })
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    let res = state.documents.delete(&key);
    observability::record("delete", &res);
    res?;
    Ok(StatusCode::NO_CONTENT)
}
