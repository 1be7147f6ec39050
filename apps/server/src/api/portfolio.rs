use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use donmoa_core::accounts::Account;
use donmoa_core::portfolio::{CashLineEdit, DividendInput, PositionLineEdit, TransactionLineEdit};
use donmoa_core::snapshots::{SnapshotCash, SnapshotPosition, SnapshotTransaction};

use super::{ApiJson, ApiPath};
use crate::{auth::AuthenticatedUser, error::ApiResult, main_lib::AppState};

async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<Vec<Account>>> {
    let accounts = state.portfolio_service.list_accounts(&user.user_id)?;
    Ok(Json(accounts))
}

async fn create_dividend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(input): ApiJson<DividendInput>,
) -> ApiResult<Json<SnapshotTransaction>> {
    let created = state
        .portfolio_service
        .create_dividend(&user.user_id, input)
        .await?;
    Ok(Json(created))
}

async fn update_cash_line(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(edit): ApiJson<CashLineEdit>,
) -> ApiResult<Json<SnapshotCash>> {
    let line = state
        .portfolio_service
        .update_cash_line(&user.user_id, id, edit)
        .await?;
    Ok(Json(line))
}

async fn update_position_line(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(edit): ApiJson<PositionLineEdit>,
) -> ApiResult<Json<SnapshotPosition>> {
    let line = state
        .portfolio_service
        .update_position_line(&user.user_id, id, edit)
        .await?;
    Ok(Json(line))
}

async fn update_transaction_line(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(edit): ApiJson<TransactionLineEdit>,
) -> ApiResult<Json<SnapshotTransaction>> {
    let line = state
        .portfolio_service
        .update_transaction_line(&user.user_id, id, edit)
        .await?;
    Ok(Json(line))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/accounts", get(list_accounts))
        .route("/portfolio/dividends", post(create_dividend))
        .route("/portfolio/cash/{id}", patch(update_cash_line))
        .route("/portfolio/positions/{id}", patch(update_position_line))
        .route(
            "/portfolio/transactions/{id}",
            patch(update_transaction_line),
        )
}
