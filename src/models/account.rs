use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Subscription tier of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
    Ultimate,
}

/// How many generation tokens a plan grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allotment {
    /// Balance is refilled to this amount once per day.
    Daily(u32),
    /// Generation is never gated on the token balance.
    Unlimited,
}

#[derive(Debug, Error)]
#[error("unknown plan: {0}")]
pub struct UnknownPlan(pub String);

impl Plan {
    pub fn allotment(self) -> Allotment {
        match self {
            Plan::Free => Allotment::Daily(3),
            Plan::Pro => Allotment::Daily(15),
            Plan::Ultimate => Allotment::Unlimited,
        }
    }

    pub fn is_unlimited(self) -> bool {
        matches!(self.allotment(), Allotment::Unlimited)
    }

    /// Whether premium templates are available on this plan.
    pub fn unlocks_premium(self) -> bool {
        matches!(self, Plan::Pro | Plan::Ultimate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
            Plan::Ultimate => "ultimate",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = UnknownPlan;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "ultimate" => Ok(Plan::Ultimate),
            other => Err(UnknownPlan(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub plan: Plan,
    pub tokens: u32,
    pub last_token_reset: DateTime<Utc>,
    pub last_generated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `accounts` table.
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub plan: String,
    pub tokens: i32,
    pub last_token_reset: DateTime<Utc>,
    pub last_generated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = anyhow::Error;

    fn try_from(row: AccountRow) -> anyhow::Result<Self> {
        Ok(Account {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            plan: row.plan.parse()?,
            tokens: u32::try_from(row.tokens)?,
            last_token_reset: row.last_token_reset,
            last_generated: row.last_generated,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewAccount {
    pub const INITIAL_PLAN: Plan = Plan::Free;
    pub const INITIAL_TOKENS: u32 = 3;

    pub fn into_account(self, id: Uuid, now: DateTime<Utc>) -> Account {
        Account {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            plan: Self::INITIAL_PLAN,
            tokens: Self::INITIAL_TOKENS,
            last_token_reset: now,
            last_generated: None,
            created_at: now,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub plan: Plan,
    /// Current balance; meaningless when `unlimited` is set.
    pub tokens: u32,
    pub unlimited: bool,
    pub last_token_reset: DateTime<Utc>,
    pub last_generated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            plan: account.plan,
            tokens: account.tokens,
            unlimited: account.plan.is_unlimited(),
            last_token_reset: account.last_token_reset,
            last_generated: account.last_generated,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub account: AccountResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_round_trips_through_str() {
        for plan in [Plan::Free, Plan::Pro, Plan::Ultimate] {
            assert_eq!(plan.as_str().parse::<Plan>().unwrap(), plan);
        }
        assert!("gold".parse::<Plan>().is_err());
    }

    #[test]
    fn test_only_ultimate_is_unlimited() {
        assert_eq!(Plan::Free.allotment(), Allotment::Daily(3));
        assert_eq!(Plan::Pro.allotment(), Allotment::Daily(15));
        assert!(Plan::Ultimate.is_unlimited());
        assert!(!Plan::Pro.is_unlimited());
    }

    #[test]
    fn test_negative_token_rows_are_rejected() {
        let now = Utc::now();
        let row = AccountRow {
            id: Uuid::new_v4(),
            username: "ada.lovelace".into(),
            email: "ada@example.com".into(),
            password_hash: "hash".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            plan: "free".into(),
            tokens: -1,
            last_token_reset: now,
            last_generated: None,
            created_at: now,
        };

        assert!(Account::try_from(row).is_err());
    }
}
