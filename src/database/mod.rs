use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::{Config, StoreBackend},
    errors::{AppError, Result},
    models::{Account, NewAccount, NewPurchase, NewResume, Purchase, Resume, ResumeEdit},
};

pub mod memory;
pub mod queries;

pub use memory::MemoryStore;

use queries::{AccountQueries, PurchaseQueries, ResumeQueries};

pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email already registered.";

fn ensure_owner(resume: &Resume, owner: Uuid) -> Result<()> {
    if resume.owner_id != owner {
        tracing::warn!(resume_id = %resume.id, caller = %owner, "Rejected access to foreign resume");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Persistence for accounts, their resumes and their purchase ledger.
///
/// Backends implement the raw row operations. The owner-scoped resume
/// operations are provided here so every backend shares one ownership check.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn ping(&self) -> Result<()>;

    /// Fails with a validation error when the email is taken.
    async fn create_account(&self, account: NewAccount) -> Result<Account>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Persists plan, balance and quota timestamps.
    async fn save_account(&self, account: &Account) -> Result<()>;

    /// Inserts the resume and saves the account in one atomic step.
    async fn commit_generation(&self, account: &Account, resume: NewResume) -> Result<Resume>;

    /// Saves the account and appends the ledger entry in one atomic step.
    async fn record_purchase(&self, account: &Account, purchase: NewPurchase) -> Result<Purchase>;

    /// Newest first.
    async fn list_purchases(&self, owner: Uuid) -> Result<Vec<Purchase>>;

    /// Newest first.
    async fn list_resumes(&self, owner: Uuid) -> Result<Vec<Resume>>;

    async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>>;

    async fn insert_resume(&self, resume: NewResume) -> Result<Resume>;

    async fn save_resume(&self, resume: &Resume) -> Result<()>;

    async fn remove_resume(&self, id: Uuid) -> Result<()>;

    async fn resume_for_owner(&self, owner: Uuid, id: Uuid) -> Result<Resume> {
        let resume = self.find_resume(id).await?.ok_or(AppError::NotFound)?;
        ensure_owner(&resume, owner)?;
        Ok(resume)
    }

    async fn update_resume(&self, owner: Uuid, id: Uuid, edit: ResumeEdit) -> Result<Resume> {
        let mut resume = self.resume_for_owner(owner, id).await?;
        resume.apply(edit, Utc::now());
        self.save_resume(&resume).await?;
        Ok(resume)
    }

    /// Copies every field into a new resume owned by the caller.
    async fn duplicate_resume(&self, owner: Uuid, id: Uuid) -> Result<Resume> {
        let original = self.resume_for_owner(owner, id).await?;
        self.insert_resume(NewResume::from(&original)).await
    }

    async fn delete_resume(&self, owner: Uuid, id: Uuid) -> Result<()> {
        self.resume_for_owner(owner, id).await?;
        self.remove_resume(id).await
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.into()))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ResumeStore for Database {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        let account = account.into_account(Uuid::new_v4(), Utc::now());

        match AccountQueries::insert(&self.pool, &account).await {
            Ok(()) => Ok(account),
            Err(AppError::Database(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                Err(AppError::Validation(DUPLICATE_EMAIL_MESSAGE.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        AccountQueries::find_by_email(&self.pool, email).await
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
        AccountQueries::find_by_id(&self.pool, id).await
    }

    async fn save_account(&self, account: &Account) -> Result<()> {
        AccountQueries::update(&self.pool, account).await
    }

    async fn commit_generation(&self, account: &Account, resume: NewResume) -> Result<Resume> {
        let resume = resume.into_resume(Uuid::new_v4(), Utc::now());

        let mut tx = self.pool.begin().await?;
        AccountQueries::update(&mut *tx, account).await?;
        ResumeQueries::insert(&mut *tx, &resume).await?;
        tx.commit().await?;

        Ok(resume)
    }

    async fn record_purchase(&self, account: &Account, purchase: NewPurchase) -> Result<Purchase> {
        let purchase = purchase.into_purchase(Uuid::new_v4(), account.id, Utc::now());

        let mut tx = self.pool.begin().await?;
        AccountQueries::update(&mut *tx, account).await?;
        PurchaseQueries::insert(&mut *tx, &purchase).await?;
        tx.commit().await?;

        Ok(purchase)
    }

    async fn list_purchases(&self, owner: Uuid) -> Result<Vec<Purchase>> {
        PurchaseQueries::list_by_owner(&self.pool, owner).await
    }

    async fn list_resumes(&self, owner: Uuid) -> Result<Vec<Resume>> {
        ResumeQueries::list_by_owner(&self.pool, owner).await
    }

    async fn find_resume(&self, id: Uuid) -> Result<Option<Resume>> {
        ResumeQueries::find_by_id(&self.pool, id).await
    }

    async fn insert_resume(&self, resume: NewResume) -> Result<Resume> {
        let resume = resume.into_resume(Uuid::new_v4(), Utc::now());
        ResumeQueries::insert(&self.pool, &resume).await?;
        Ok(resume)
    }

    async fn save_resume(&self, resume: &Resume) -> Result<()> {
        ResumeQueries::update(&self.pool, resume).await
    }

    async fn remove_resume(&self, id: Uuid) -> Result<()> {
        if !ResumeQueries::delete(&self.pool, id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

/// Builds the configured store. Postgres stores are migrated before use.
pub async fn create_store(config: &Config) -> Result<Arc<dyn ResumeStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let db = Database::new(&config.database_url).await?;
            db.migrate().await?;
            tracing::info!("Using PostgreSQL store");
            Ok(Arc::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
