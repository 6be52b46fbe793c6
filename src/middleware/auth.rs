use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{
    errors::AppError,
    handlers::AppState,
    models::Account,
};

/// The account behind a valid bearer access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account: Account,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Auth("Authentication required".to_string()))?;

        let claims = state
            .jwt
            .verify_access_token(token)
            .map_err(|_| AppError::Auth("Invalid or expired token".to_string()))?;

        // The token may outlive the account.
        let account = state
            .store
            .find_account(claims.account_id()?)
            .await?
            .ok_or_else(|| AppError::Auth("Account not found".to_string()))?;

        Ok(AuthenticatedUser { account })
    }
}
