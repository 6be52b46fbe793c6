use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    errors::{AppError, Result},
    models::{Account, Allotment, NewPurchase, Plan},
    services::quota::QuotaPolicy,
};

/// Token pack sizes and their prices (INR).
pub const TOKEN_PACKS: [(u32, i32); 2] = [(1, 50), (5, 100)];

pub const PRO_PRICE: i32 = 199;
pub const PRO_BONUS_TOKENS: u32 = 15;
pub const ULTIMATE_PRICE: i32 = 499;

pub fn token_pack_price(count: u32) -> Option<i32> {
    TOKEN_PACKS
        .iter()
        .find(|(size, _)| *size == count)
        .map(|(_, price)| *price)
}

/// Moves the account to a paid plan and returns the ledger entry to record.
/// Unknown plans leave the account untouched.
pub fn upgrade(account: &mut Account, plan: &str) -> Result<NewPurchase> {
    match plan.parse::<Plan>() {
        Ok(Plan::Pro) => {
            account.tokens = account.tokens.saturating_add(PRO_BONUS_TOKENS);
            account.plan = Plan::Pro;
            Ok(NewPurchase {
                amount: PRO_PRICE,
                description: "Pro Pack".to_string(),
            })
        }
        Ok(Plan::Ultimate) => {
            account.plan = Plan::Ultimate;
            Ok(NewPurchase {
                amount: ULTIMATE_PRICE,
                description: "Ultimate Pack".to_string(),
            })
        }
        Ok(Plan::Free) | Err(_) => Err(AppError::InvalidPlan(plan.to_string())),
    }
}

pub fn buy_tokens(account: &mut Account, count: u32) -> Result<NewPurchase> {
    let amount = token_pack_price(count).ok_or(AppError::InvalidTokenPack(count))?;

    account.tokens = account.tokens.saturating_add(count);
    Ok(NewPurchase {
        amount,
        description: format!("{} Token Pack", count),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanOffer {
    pub plan: Plan,
    /// `None` for unlimited plans.
    pub daily_tokens: Option<u32>,
    pub price: i32,
    pub premium_templates: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPackOffer {
    pub tokens: u32,
    pub price: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PricingTable {
    pub plans: Vec<PlanOffer>,
    pub token_packs: Vec<TokenPackOffer>,
    pub free_templates: Vec<String>,
    pub premium_templates: Vec<String>,
}

impl PricingTable {
    pub fn new(policy: &QuotaPolicy) -> Self {
        let offer = |plan: Plan, price: i32| PlanOffer {
            plan,
            daily_tokens: match plan.allotment() {
                Allotment::Daily(tokens) => Some(tokens),
                Allotment::Unlimited => None,
            },
            price,
            premium_templates: plan.unlocks_premium(),
        };

        Self {
            plans: vec![
                offer(Plan::Free, 0),
                offer(Plan::Pro, PRO_PRICE),
                offer(Plan::Ultimate, ULTIMATE_PRICE),
            ],
            token_packs: TOKEN_PACKS
                .iter()
                .map(|&(tokens, price)| TokenPackOffer { tokens, price })
                .collect(),
            free_templates: policy.free_templates().map(str::to_string).collect(),
            premium_templates: policy.premium_templates().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewAccount;
    use chrono::Utc;
    use uuid::Uuid;

    fn free_account(tokens: u32) -> Account {
        let mut account = NewAccount {
            username: "alan.turing".into(),
            email: "alan@example.com".into(),
            password_hash: "hash".into(),
            first_name: "Alan".into(),
            last_name: "Turing".into(),
        }
        .into_account(Uuid::new_v4(), Utc::now());
        account.tokens = tokens;
        account
    }

    #[test]
    fn test_single_token_pack() {
        let mut account = free_account(2);
        let purchase = buy_tokens(&mut account, 1).unwrap();

        assert_eq!(account.tokens, 3);
        assert_eq!(purchase.amount, 50);
        assert_eq!(purchase.description, "1 Token Pack");
    }

    #[test]
    fn test_five_token_pack() {
        let mut account = free_account(0);
        let purchase = buy_tokens(&mut account, 5).unwrap();

        assert_eq!(account.tokens, 5);
        assert_eq!(purchase.amount, 100);
    }

    #[test]
    fn test_unknown_pack_leaves_account_unchanged() {
        let mut account = free_account(2);
        let before = account.clone();

        let result = buy_tokens(&mut account, 3);

        assert!(matches!(result, Err(AppError::InvalidTokenPack(3))));
        assert_eq!(account, before);
    }

    #[test]
    fn test_pro_upgrade_adds_bonus_tokens() {
        let mut account = free_account(1);
        let purchase = upgrade(&mut account, "pro").unwrap();

        assert_eq!(account.plan, Plan::Pro);
        assert_eq!(account.tokens, 16);
        assert_eq!(purchase.amount, 199);
        assert_eq!(purchase.description, "Pro Pack");
    }

    #[test]
    fn test_ultimate_upgrade_is_unlimited_without_sentinel() {
        let mut account = free_account(2);
        let purchase = upgrade(&mut account, "ultimate").unwrap();

        assert_eq!(account.plan, Plan::Ultimate);
        assert!(account.plan.is_unlimited());
        assert_eq!(account.tokens, 2);
        assert_eq!(purchase.amount, 499);
    }

    #[test]
    fn test_invalid_plan_performs_no_mutation() {
        for plan in ["gold", "free", "", "PRO"] {
            let mut account = free_account(2);
            let before = account.clone();

            assert!(matches!(upgrade(&mut account, plan), Err(AppError::InvalidPlan(_))));
            assert_eq!(account, before);
        }
    }

    #[test]
    fn test_pricing_table_lists_packs_and_templates() {
        let policy = QuotaPolicy::new(["classic"], ["modern"]);
        let table = PricingTable::new(&policy);

        assert_eq!(table.token_packs.len(), 2);
        assert_eq!(table.plans[2].daily_tokens, None);
        assert_eq!(table.free_templates, vec!["classic"]);
        assert_eq!(table.premium_templates, vec!["modern"]);
    }
}
