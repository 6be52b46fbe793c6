use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{handlers::AppState, services::metrics::RequestTimer};

pub async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let timer = RequestTimer::start();
    let method = request.method().clone();

    let response = next.run(request).await;

    state
        .metrics
        .record_response(method.as_str(), response.status().as_u16(), timer.elapsed());

    response
}
