use axum::{extract::State, response::Json};
use chrono::Utc;
use serde_json::json;

use crate::{
    errors::Result,
    handlers::AppState,
    middleware::AuthenticatedUser,
    models::{Account, AccountResponse},
    services::{billing::PricingTable, quota},
};

/// Applies the daily refill and persists it when something changed.
pub async fn refresh_quota(state: &AppState, account: &mut Account) -> Result<()> {
    if quota::reset_if_needed(account, Utc::now()) {
        state.store.save_account(account).await?;
        tracing::debug!(account_id = %account.id, tokens = account.tokens, "Daily tokens refilled");
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "account"
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser { mut account }: AuthenticatedUser,
) -> Result<Json<serde_json::Value>> {
    refresh_quota(&state, &mut account).await?;

    Ok(Json(json!({
        "data": AccountResponse::from(&account)
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/pricing",
    responses((status = 200, description = "Plans, token packs and templates", body = PricingTable)),
    tag = "account"
)]
pub async fn pricing(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    Ok(Json(json!({
        "data": PricingTable::new(&state.policy)
    })))
}
