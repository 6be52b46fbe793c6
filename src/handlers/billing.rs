use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::json;

use crate::{
    errors::Result,
    handlers::{account::refresh_quota, AppState},
    middleware::AuthenticatedUser,
    models::{Account, AccountResponse, NewPurchase, Purchase},
    services::billing,
};

async fn commit(
    state: &AppState,
    account: &Account,
    outcome: Result<NewPurchase>,
    kind: &str,
) -> Result<Json<serde_json::Value>> {
    let purchase = state.store.record_purchase(account, outcome?).await?;
    state.metrics.record_purchase(kind);
    tracing::info!(
        account_id = %account.id,
        amount = purchase.amount,
        description = %purchase.description,
        "Purchase recorded"
    );

    Ok(Json(json!({
        "message": format!("{} purchased", purchase.description),
        "data": {
            "purchase": purchase,
            "account": AccountResponse::from(account)
        }
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/billing/tokens/{count}",
    params(("count" = String, Path, description = "Token pack size: 1 or 5")),
    responses(
        (status = 200, description = "Tokens added"),
        (status = 400, description = "Invalid token pack selected")
    ),
    security(("bearer_auth" = [])),
    tag = "billing"
)]
pub async fn buy_tokens(
    State(state): State<AppState>,
    AuthenticatedUser { mut account }: AuthenticatedUser,
    Path(count): Path<String>,
) -> Result<Json<serde_json::Value>> {
    refresh_quota(&state, &mut account).await?;

    // Anything that is not a number is not a pack either.
    let count = count.parse::<u32>().unwrap_or(0);
    let outcome = billing::buy_tokens(&mut account, count);
    commit(&state, &account, outcome, "tokens").await
}

#[utoipa::path(
    post,
    path = "/api/v1/billing/upgrade/{plan}",
    params(("plan" = String, Path, description = "Target plan: pro or ultimate")),
    responses(
        (status = 200, description = "Plan upgraded"),
        (status = 400, description = "Invalid upgrade option")
    ),
    security(("bearer_auth" = [])),
    tag = "billing"
)]
pub async fn upgrade(
    State(state): State<AppState>,
    AuthenticatedUser { mut account }: AuthenticatedUser,
    Path(plan): Path<String>,
) -> Result<Json<serde_json::Value>> {
    refresh_quota(&state, &mut account).await?;

    let outcome = billing::upgrade(&mut account, &plan);
    commit(&state, &account, outcome, "upgrade").await
}

#[utoipa::path(
    get,
    path = "/api/v1/billing/purchases",
    responses((status = 200, description = "Purchase ledger, newest first", body = [Purchase])),
    security(("bearer_auth" = [])),
    tag = "billing"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    AuthenticatedUser { account }: AuthenticatedUser,
) -> Result<Json<serde_json::Value>> {
    let purchases = state.store.list_purchases(account.id).await?;

    Ok(Json(json!({
        "data": purchases
    })))
}
