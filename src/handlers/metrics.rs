use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
};

pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
