use axum::{extract::State, response::Json};

use crate::{
    errors::Result,
    handlers::AppState,
    middleware::AuthenticatedUser,
    services::{
        bio::{write_bio_or_fallback, BioProfile, BioResponse},
        rate_limiter::{self, BIO_SCOPE},
    },
};

#[utoipa::path(
    post,
    path = "/api/v1/bio/regenerate",
    request_body = BioProfile,
    responses(
        (status = 200, description = "Generated or fallback bio", body = BioResponse),
        (status = 429, description = "Rate limit exceeded")
    ),
    security(("bearer_auth" = [])),
    tag = "resumes"
)]
pub async fn regenerate_bio(
    State(state): State<AppState>,
    AuthenticatedUser { account }: AuthenticatedUser,
    Json(profile): Json<BioProfile>,
) -> Result<Json<BioResponse>> {
    rate_limiter::admit(state.ai_gate(), account.id, BIO_SCOPE).await?;

    let written = write_bio_or_fallback(state.bio_writer.as_ref(), &profile).await;
    state.metrics.record_bio(written.source);

    Ok(Json(BioResponse { bio: written.text }))
}
