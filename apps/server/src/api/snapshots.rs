use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use donmoa_core::snapshots::{
    SnapshotCommitInput, SnapshotLines, SnapshotListQuery, SnapshotPage, SnapshotSummary,
};
use donmoa_core::Error as CoreError;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::{
    auth::AuthenticatedUser,
    error::{ApiError, ApiResult},
    idempotency::{IDEMPOTENCY_HEADER, MAX_KEY_LEN},
    main_lib::AppState,
};

/// Set on responses served from the idempotency cache.
pub const IDEMPOTENT_REPLAY_HEADER: &str = "idempotent-replay";

fn idempotency_key(headers: &HeaderMap) -> ApiResult<Option<String>> {
    let Some(raw) = headers.get(IDEMPOTENCY_HEADER) else {
        return Ok(None);
    };
    let key = raw
        .to_str()
        .map_err(|_| ApiError::InvalidRequest("Idempotency-Key must be ASCII".to_string()))?
        .trim();
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(ApiError::InvalidRequest(format!(
            "Idempotency-Key must be 1 to {} characters",
            MAX_KEY_LEN
        )));
    }
    Ok(Some(key.to_string()))
}

async fn commit_snapshot(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<SnapshotCommitInput>,
) -> ApiResult<Response> {
    let key = idempotency_key(&headers)?;

    if let Some(key) = &key {
        if let Some(cached) = state.idempotency.get(&user.user_id, key) {
            tracing::info!("Replaying commit for idempotency key {}", key);
            return Ok((
                StatusCode::OK,
                [(
                    HeaderName::from_static(IDEMPOTENT_REPLAY_HEADER),
                    HeaderValue::from_static("true"),
                )],
                Json(cached),
            )
                .into_response());
        }
    }

    let result = state
        .snapshot_service
        .commit_snapshot(&user.user_id, input)
        .await?;

    if let Some(key) = &key {
        state.idempotency.insert(&user.user_id, key, result.clone());
    }
    Ok(Json(result).into_response())
}

async fn list_snapshots(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<SnapshotListQuery>,
) -> ApiResult<Json<SnapshotPage>> {
    let page = state.snapshot_service.list_snapshots(&user.user_id, query)?;
    Ok(Json(page))
}

async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<SnapshotSummary>> {
    state
        .snapshot_service
        .get_snapshot(&user.user_id, id)?
        .map(Json)
        .ok_or_else(|| CoreError::NotFound(format!("Snapshot {} not found", id)).into())
}

async fn get_snapshot_lines(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<SnapshotLines>> {
    let lines = state
        .portfolio_service
        .get_snapshot_lines(&user.user_id, id)?;
    Ok(Json(lines))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/snapshots/commit", post(commit_snapshot))
        .route("/snapshots", get(list_snapshots))
        .route("/snapshots/{id}", get(get_snapshot))
        .route("/snapshots/{id}/lines", get(get_snapshot_lines))
}
