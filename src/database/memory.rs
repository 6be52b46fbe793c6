use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    database::{ResumeStore, DUPLICATE_EMAIL_MESSAGE},
    errors::{AppError, Result},
    models::{Account, NewAccount, NewPurchase, NewResume, Purchase, Resume},
};

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    /// Insertion order, oldest first.
    resumes: Vec<Resume>,
    purchases: Vec<Purchase>,
}

impl MemoryState {
    fn replace_account(&mut self, account: &Account) -> Result<()> {
        let slot = self.accounts.get_mut(&account.id).ok_or(AppError::NotFound)?;
        *slot = account.clone();
        Ok(())
    }
}

/// Process-local store for development and tests.
///
/// A single lock guards all tables, so multi-row commits are atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        let mut state = self.state.lock().await;
        if state.accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::Validation(DUPLICATE_EMAIL_MESSAGE.to_string()));
        }

        let account = account.into_account(Uuid::new_v4(), Utc::now());
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn save_account(&self, account: &Account) -> Result<()> {
        self.state.lock().await.replace_account(account)
    }

    async fn commit_generation(&self, account: &Account, resume: NewResume) -> Result<Resume> {
        let mut state = self.state.lock().await;
        state.replace_account(account)?;

        let resume = resume.into_resume(Uuid::new_v4(), Utc::now());
        state.resumes.push(resume.clone());
        Ok(resume)
    }

    async fn record_purchase(&self, account: &Account, purchase: NewPurchase) -> Result<Purchase> {
        let mut state = self.state.lock().await;
        state.replace_account(account)?;

        let purchase = purchase.into_purchase(Uuid::new_v4(), account.id, Utc::now());
        state.purchases.push(purchase.clone());
        Ok(purchase)
    }

    async fn list_purchases(&self, owner: Uuid) -> Result<Vec<Purchase>> {
        let state = self.state.lock().await;
        Ok(state
            .purchases
            .iter()
            .rev()
            .filter(|p| p.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn list_resumes(&self, owner: Uuid) -> Result<Vec<Resume>> {
        let state = self.state.lock().await;
        Ok(state
            .resumes
            .iter()
            .rev()
            .filter(|r| r.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>> {
        let state = self.state.lock().await;
        Ok(state.resumes.iter().find(|r| r.id == id).cloned())
    }

    async fn insert_resume(&self, resume: NewResume) -> Result<Resume> {
        let resume = resume.into_resume(Uuid::new_v4(), Utc::now());
        self.state.lock().await.resumes.push(resume.clone());
        Ok(resume)
    }

    async fn save_resume(&self, resume: &Resume) -> Result<()> {
        let mut state = self.state.lock().await;
        let slot = state
            .resumes
            .iter_mut()
            .find(|r| r.id == resume.id)
            .ok_or(AppError::NotFound)?;
        *slot = resume.clone();
        Ok(())
    }

    async fn remove_resume(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.lock().await;
        let before = state.resumes.len();
        state.resumes.retain(|r| r.id != id);
        if state.resumes.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResumeEdit, ResumeFields, DEFAULT_TEMPLATE};

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            username: "ada.lovelace".into(),
            email: email.into(),
            password_hash: "hash".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    fn new_resume(owner: Uuid, name: &str) -> NewResume {
        NewResume {
            owner_id: owner,
            fields: ResumeFields {
                name: name.into(),
                skills: "Rust,SQL".into(),
                ..Default::default()
            },
            template: DEFAULT_TEMPLATE.into(),
            profile_pic_url: Some("/static/uploads/a_me.png".into()),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store.create_account(new_account("ada@example.com")).await.unwrap();

        let err = store
            .create_account(new_account("ada@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(msg) if msg == DUPLICATE_EMAIL_MESSAGE));
    }

    #[tokio::test]
    async fn test_commit_generation_saves_account_and_resume() {
        let store = MemoryStore::new();
        let mut account = store.create_account(new_account("ada@example.com")).await.unwrap();
        account.tokens = 2;

        let resume = store
            .commit_generation(&account, new_resume(account.id, "Ada"))
            .await
            .unwrap();

        assert_eq!(store.find_account(account.id).await.unwrap().unwrap().tokens, 2);
        assert_eq!(store.list_resumes(account.id).await.unwrap(), vec![resume]);
    }

    #[tokio::test]
    async fn test_resumes_are_listed_newest_first() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let first = store.insert_resume(new_resume(owner, "first")).await.unwrap();
        let second = store.insert_resume(new_resume(owner, "second")).await.unwrap();
        store.insert_resume(new_resume(Uuid::new_v4(), "other")).await.unwrap();

        let listed = store.list_resumes(owner).await.unwrap();

        assert_eq!(listed, vec![second, first]);
    }

    #[tokio::test]
    async fn test_foreign_resume_access_is_unauthorized() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let resume = store.insert_resume(new_resume(owner, "Ada")).await.unwrap();

        assert!(matches!(
            store.resume_for_owner(intruder, resume.id).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            store.delete_resume(intruder, resume.id).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            store.duplicate_resume(intruder, resume.id).await,
            Err(AppError::Unauthorized)
        ));

        assert!(store.find_resume(resume.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_resume_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.delete_resume(Uuid::new_v4(), Uuid::new_v4()).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_and_duplicate() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let resume = store.insert_resume(new_resume(owner, "Ada")).await.unwrap();

        let updated = store
            .update_resume(
                owner,
                resume.id,
                ResumeEdit {
                    fields: ResumeFields {
                        name: "Ada L.".into(),
                        ..Default::default()
                    },
                    template: "minimal".into(),
                    profile_pic_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.profile_pic_url, resume.profile_pic_url);

        let copy = store.duplicate_resume(owner, resume.id).await.unwrap();
        assert_ne!(copy.id, resume.id);
        assert_eq!(copy.fields(), updated.fields());
        assert_eq!(copy.template, "minimal");
        assert_eq!(store.list_resumes(owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_purchases_are_scoped_and_newest_first() {
        let store = MemoryStore::new();
        let account = store.create_account(new_account("ada@example.com")).await.unwrap();
        let other = store.create_account(new_account("bob@example.com")).await.unwrap();

        let first = store
            .record_purchase(&account, NewPurchase { amount: 50, description: "1 Token Pack".into() })
            .await
            .unwrap();
        let second = store
            .record_purchase(&account, NewPurchase { amount: 199, description: "Pro Pack".into() })
            .await
            .unwrap();
        store
            .record_purchase(&other, NewPurchase { amount: 50, description: "1 Token Pack".into() })
            .await
            .unwrap();

        assert_eq!(store.list_purchases(account.id).await.unwrap(), vec![second, first]);
    }
}
