use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Account ID
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: TokenType,
}

impl Claims {
    pub fn account_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth("Invalid token".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_duration: Duration,
    refresh_token_duration: Duration,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            access_token_duration: Duration::hours(1),
            refresh_token_duration: Duration::days(7),
        }
    }

    fn generate(&self, account_id: Uuid, email: &str, token_type: TokenType) -> Result<String> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_token_duration,
            TokenType::Refresh => self.refresh_token_duration,
        };
        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            token_type,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Auth(format!("Failed to generate token: {}", e)))
    }

    pub fn generate_access_token(&self, account_id: Uuid, email: &str) -> Result<String> {
        self.generate(account_id, email, TokenType::Access)
    }

    pub fn generate_refresh_token(&self, account_id: Uuid, email: &str) -> Result<String> {
        self.generate(account_id, email, TokenType::Refresh)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims> {
        let claims = self.verify_token(token)?;

        match claims.token_type {
            TokenType::Access => Ok(claims),
            TokenType::Refresh => Err(AppError::Auth(
                "Expected access token, got refresh token".to_string(),
            )),
        }
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims> {
        let claims = self.verify_token(token)?;

        match claims.token_type {
            TokenType::Refresh => Ok(claims),
            TokenType::Access => Err(AppError::Auth(
                "Expected refresh token, got access token".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_generation_and_verification() {
        let jwt_service = JwtService::new("test-secret");
        let account_id = Uuid::new_v4();
        let email = "test@example.com";

        let access_token = jwt_service.generate_access_token(account_id, email).unwrap();
        let refresh_token = jwt_service.generate_refresh_token(account_id, email).unwrap();

        let access_claims = jwt_service.verify_access_token(&access_token).unwrap();
        let refresh_claims = jwt_service.verify_refresh_token(&refresh_token).unwrap();

        assert_eq!(access_claims.account_id().unwrap(), account_id);
        assert_eq!(access_claims.email, email);
        assert_eq!(refresh_claims.account_id().unwrap(), account_id);
        assert!(refresh_claims.exp - refresh_claims.iat > access_claims.exp - access_claims.iat);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let jwt_service = JwtService::new("test-secret");
        let account_id = Uuid::new_v4();

        let access_token = jwt_service.generate_access_token(account_id, "a@b.co").unwrap();
        let refresh_token = jwt_service.generate_refresh_token(account_id, "a@b.co").unwrap();

        assert!(jwt_service.verify_refresh_token(&access_token).is_err());
        assert!(jwt_service.verify_access_token(&refresh_token).is_err());
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let token = JwtService::new("one")
            .generate_access_token(Uuid::new_v4(), "a@b.co")
            .unwrap();

        assert!(JwtService::new("two").verify_access_token(&token).is_err());
    }
}
