use axum::{extract::State, http::StatusCode, response::Json};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::{
    auth::PasswordService,
    errors::{AppError, Result},
    handlers::AppState,
    models::{
        Account, AccountResponse, AuthResponse, LoginRequest, NewAccount, RefreshRequest,
        RegisterRequest,
    },
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("email pattern is valid")
});

const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=30;
const INVALID_CREDENTIALS: &str = "Invalid email or password.";

fn validate_name(label: &str, value: &str) -> Result<()> {
    if !NAME_LENGTH.contains(&value.chars().count()) {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {} characters",
            label,
            NAME_LENGTH.start(),
            NAME_LENGTH.end()
        )));
    }
    Ok(())
}

pub fn validate_registration(request: &RegisterRequest) -> Result<()> {
    validate_name("First name", request.first_name.trim())?;
    validate_name("Last name", request.last_name.trim())?;

    if !EMAIL_RE.is_match(request.email.trim()) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    PasswordService::validate_password(&request.password, &request.confirm_password)
}

pub fn username_for(first_name: &str, last_name: &str) -> String {
    format!("{}.{}", first_name.trim(), last_name.trim()).to_lowercase()
}

fn issue_tokens(state: &AppState, account: &Account) -> Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: state.jwt.generate_access_token(account.id, &account.email)?,
        refresh_token: state.jwt.generate_refresh_token(account.id, &account.email)?,
        account: AccountResponse::from(account),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input or email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    validate_registration(&request)?;

    let password = request.password.clone();
    let cost = state.config.bcrypt_cost;
    let password_hash =
        tokio::task::spawn_blocking(move || PasswordService::hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

    let account = state
        .store
        .create_account(NewAccount {
            username: username_for(&request.first_name, &request.last_name),
            email: request.email.trim().to_string(),
            password_hash,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
        })
        .await?;

    tracing::info!(account_id = %account.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account registered successfully",
            "data": issue_tokens(&state, &account)?
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>> {
    let account = state
        .store
        .find_account_by_email(request.email.trim())
        .await?
        .ok_or_else(|| AppError::Auth(INVALID_CREDENTIALS.to_string()))?;

    let password = request.password;
    let password_hash = account.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || {
        PasswordService::verify_password(&password, &password_hash)
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))??;

    if !valid {
        return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
    }

    Ok(Json(json!({
        "message": "Login successful",
        "data": issue_tokens(&state, &account)?
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token issued"),
        (status = 401, description = "Invalid refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>> {
    let claims = state.jwt.verify_refresh_token(&request.refresh_token)?;

    let account = state
        .store
        .find_account(claims.account_id()?)
        .await?
        .ok_or_else(|| AppError::Auth("Account not found".to_string()))?;

    let access_token = state.jwt.generate_access_token(account.id, &account.email)?;

    Ok(Json(json!({
        "message": "Token refreshed successfully",
        "data": {
            "access_token": access_token,
            "account": AccountResponse::from(&account)
        }
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 200, description = "Logged out")),
    tag = "auth"
)]
pub async fn logout() -> Result<Json<serde_json::Value>> {
    // Tokens are stateless; the client discards them.
    Ok(Json(json!({
        "message": "Logged out successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(first: &str, last: &str, email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_registration(&request("Ada", "Lovelace", "ada@example.com", "secret", "secret")).is_ok());
    }

    #[test]
    fn test_registration_rules() {
        let cases = [
            request("A", "Lovelace", "ada@example.com", "secret", "secret"),
            request("Ada", &"x".repeat(31), "ada@example.com", "secret", "secret"),
            request("Ada", "Lovelace", "not-an-email", "secret", "secret"),
            request("Ada", "Lovelace", "ada@example", "secret", "secret"),
            request("Ada", "Lovelace", "ada@example.com", "12345", "12345"),
            request("Ada", "Lovelace", "ada@example.com", "secret", "secrets"),
        ];

        for case in cases {
            assert!(matches!(validate_registration(&case), Err(AppError::Validation(_))), "{case:?}");
        }
    }

    #[test]
    fn test_username_is_lowercased_first_dot_last() {
        assert_eq!(username_for(" Ada ", "Lovelace"), "ada.lovelace");
    }
}
