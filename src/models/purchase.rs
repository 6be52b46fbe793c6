use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Append-only ledger entry. Amounts are in INR.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, ToSchema)]
pub struct Purchase {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub amount: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    pub amount: i32,
    pub description: String,
}

impl NewPurchase {
    pub fn into_purchase(self, id: Uuid, owner_id: Uuid, now: DateTime<Utc>) -> Purchase {
        Purchase {
            id,
            owner_id,
            amount: self.amount,
            description: self.description,
            created_at: now,
        }
    }
}
