use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::AppState;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::liveness,
        crate::handlers::health::readiness,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::logout,
        crate::handlers::account::me,
        crate::handlers::account::pricing,
        crate::handlers::resumes::generate_resume,
        crate::handlers::resumes::list_resumes,
        crate::handlers::resumes::view_resume,
        crate::handlers::resumes::edit_resume,
        crate::handlers::resumes::duplicate_resume,
        crate::handlers::resumes::delete_resume,
        crate::handlers::resumes::download_resume,
        crate::handlers::billing::buy_tokens,
        crate::handlers::billing::upgrade,
        crate::handlers::billing::list_purchases,
        crate::handlers::bio::regenerate_bio,
    ),
    components(
        schemas(
            crate::models::Plan,
            crate::models::RegisterRequest,
            crate::models::LoginRequest,
            crate::models::RefreshRequest,
            crate::models::AccountResponse,
            crate::models::AuthResponse,
            crate::models::ResumeFields,
            crate::models::Resume,
            crate::models::RenderContext,
            crate::models::Purchase,
            crate::services::billing::PricingTable,
            crate::services::billing::PlanOffer,
            crate::services::billing::TokenPackOffer,
            crate::services::bio::BioProfile,
            crate::services::bio::BioResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "account", description = "Account and pricing"),
        (name = "resumes", description = "Resume generation and management"),
        (name = "billing", description = "Token packs and plan upgrades"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "Resumify API",
        version = "1.0.0",
        description = "Resume generation with daily token quotas and AI-written bios"
    )
)]
pub struct ApiDoc;

pub fn create_docs_router() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
