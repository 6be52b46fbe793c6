use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

use crate::models::{Account, Allotment};

/// Minimum time between two daily refills of an account's balance.
pub fn token_reset_interval() -> Duration {
    Duration::days(1)
}

/// Refills the balance to the plan's daily allotment once a full day has
/// passed since the last refill. Unlimited plans keep their balance but
/// still have the reset timestamp advanced.
///
/// Returns whether the account was modified.
pub fn reset_if_needed(account: &mut Account, now: DateTime<Utc>) -> bool {
    if now.signed_duration_since(account.last_token_reset) < token_reset_interval() {
        return false;
    }

    if let Allotment::Daily(tokens) = account.plan.allotment() {
        account.tokens = tokens;
    }
    account.last_token_reset = now;
    true
}

pub fn has_tokens(account: &Account) -> bool {
    account.tokens > 0 || account.plan.is_unlimited()
}

pub fn deduct_token(account: &mut Account) {
    if !account.plan.is_unlimited() {
        account.tokens = account.tokens.saturating_sub(1);
    }
}

/// Template access rules: which templates exist and which are free.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    free_templates: BTreeSet<String>,
    premium_templates: BTreeSet<String>,
}

impl QuotaPolicy {
    pub fn new<F, P>(free_templates: F, premium_templates: P) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let free_templates: BTreeSet<String> =
            free_templates.into_iter().map(Into::into).collect();
        let premium_templates = premium_templates
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !free_templates.contains(t))
            .collect();

        Self {
            free_templates,
            premium_templates,
        }
    }

    pub fn is_known_template(&self, template: &str) -> bool {
        self.free_templates.contains(template) || self.premium_templates.contains(template)
    }

    pub fn is_premium_template(&self, template: &str) -> bool {
        !self.free_templates.contains(template)
    }

    pub fn can_use_template(&self, account: &Account, template: &str) -> bool {
        !self.is_premium_template(template) || account.plan.unlocks_premium()
    }

    pub fn free_templates(&self) -> impl Iterator<Item = &str> {
        self.free_templates.iter().map(String::as_str)
    }

    pub fn premium_templates(&self) -> impl Iterator<Item = &str> {
        self.premium_templates.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewAccount, Plan};
    use uuid::Uuid;

    fn account(plan: Plan, tokens: u32, last_reset: DateTime<Utc>) -> Account {
        let mut account = NewAccount {
            username: "grace.hopper".into(),
            email: "grace@example.com".into(),
            password_hash: "hash".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
        }
        .into_account(Uuid::new_v4(), last_reset);
        account.plan = plan;
        account.tokens = tokens;
        account
    }

    fn policy() -> QuotaPolicy {
        QuotaPolicy::new(["classic", "minimal"], ["modern", "creative"])
    }

    #[test]
    fn test_deduct_never_goes_negative() {
        let now = Utc::now();
        for plan in [Plan::Free, Plan::Pro, Plan::Ultimate] {
            for tokens in [0, 1, 2, 15] {
                let mut acc = account(plan, tokens, now);
                deduct_token(&mut acc);
                deduct_token(&mut acc);
                assert!(acc.tokens <= tokens);
            }
        }

        let mut empty = account(Plan::Free, 0, now);
        deduct_token(&mut empty);
        assert_eq!(empty.tokens, 0);
    }

    #[test]
    fn test_deduct_is_noop_for_unlimited_plan() {
        let mut acc = account(Plan::Ultimate, 7, Utc::now());
        deduct_token(&mut acc);
        assert_eq!(acc.tokens, 7);
    }

    #[test]
    fn test_reset_happens_once_per_elapsed_day() {
        let start = Utc::now();
        let mut acc = account(Plan::Free, 0, start);

        assert!(!reset_if_needed(&mut acc, start + Duration::hours(23)));
        assert_eq!(acc.tokens, 0);

        let first = start + Duration::days(1);
        assert!(reset_if_needed(&mut acc, first));
        assert_eq!(acc.tokens, 3);
        assert_eq!(acc.last_token_reset, first);

        acc.tokens = 1;
        assert!(!reset_if_needed(&mut acc, first + Duration::hours(5)));
        assert!(!reset_if_needed(&mut acc, first + Duration::hours(12)));
        assert_eq!(acc.tokens, 1);

        assert!(reset_if_needed(&mut acc, first + Duration::days(3)));
        assert_eq!(acc.tokens, 3);
    }

    #[test]
    fn test_reset_uses_plan_allotment() {
        let start = Utc::now();
        let later = start + Duration::days(2);

        let mut pro = account(Plan::Pro, 2, start);
        reset_if_needed(&mut pro, later);
        assert_eq!(pro.tokens, 15);

        let mut ultimate = account(Plan::Ultimate, 4, start);
        assert!(reset_if_needed(&mut ultimate, later));
        assert_eq!(ultimate.tokens, 4);
        assert_eq!(ultimate.last_token_reset, later);
    }

    #[test]
    fn test_ultimate_always_has_tokens() {
        let now = Utc::now();
        assert!(has_tokens(&account(Plan::Ultimate, 0, now)));
        assert!(has_tokens(&account(Plan::Free, 1, now)));
        assert!(!has_tokens(&account(Plan::Free, 0, now)));
        assert!(!has_tokens(&account(Plan::Pro, 0, now)));
    }

    #[test]
    fn test_premium_templates_require_paid_plan() {
        let policy = policy();
        let now = Utc::now();

        assert!(policy.is_premium_template("modern"));
        assert!(!policy.is_premium_template("classic"));

        assert!(!policy.can_use_template(&account(Plan::Free, 3, now), "modern"));
        assert!(policy.can_use_template(&account(Plan::Free, 3, now), "classic"));
        assert!(policy.can_use_template(&account(Plan::Pro, 3, now), "modern"));
        assert!(policy.can_use_template(&account(Plan::Ultimate, 0, now), "creative"));
    }

    #[test]
    fn test_template_listed_as_both_counts_as_free() {
        let policy = QuotaPolicy::new(["classic"], ["classic", "modern"]);
        assert!(!policy.is_premium_template("classic"));
        assert_eq!(policy.premium_templates().collect::<Vec<_>>(), vec!["modern"]);
        assert!(policy.is_known_template("modern"));
        assert!(!policy.is_known_template("retro"));
    }
}
