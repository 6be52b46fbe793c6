use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::{Account, AccountRow, Purchase, Resume},
};

macro_rules! account_columns {
    () => {
        "id, username, email, password_hash, first_name, last_name, plan, tokens, \
         last_token_reset, last_generated, created_at"
    };
}

macro_rules! resume_columns {
    () => {
        "id, owner_id, name, profession, email, phone, linkedin, bio, skills, job_title, \
         company, job_desc, degree, institute, grad_year, profile_pic_url, template, \
         created_at, updated_at"
    };
}

fn token_column(account: &Account) -> Result<i32> {
    i32::try_from(account.tokens).map_err(|e| AppError::Internal(e.into()))
}

fn into_account(row: AccountRow) -> Result<Account> {
    Account::try_from(row).map_err(AppError::Internal)
}

pub struct AccountQueries;

impl AccountQueries {
    pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, account: &Account) -> Result<()> {
        sqlx::query(concat!(
            "INSERT INTO accounts (",
            account_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.plan.as_str())
        .bind(token_column(account)?)
        .bind(account.last_token_reset)
        .bind(account.last_generated)
        .bind(account.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_email<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
    ) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(concat!(
            "SELECT ",
            account_columns!(),
            " FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(executor)
        .await?;

        row.map(into_account).transpose()
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(concat!(
            "SELECT ",
            account_columns!(),
            " FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        row.map(into_account).transpose()
    }

    pub async fn update<'e, E: PgExecutor<'e>>(executor: E, account: &Account) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET plan = $2, tokens = $3, last_token_reset = $4, last_generated = $5
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(account.plan.as_str())
        .bind(token_column(account)?)
        .bind(account.last_token_reset)
        .bind(account.last_generated)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

pub struct ResumeQueries;

impl ResumeQueries {
    pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, resume: &Resume) -> Result<()> {
        sqlx::query(concat!(
            "INSERT INTO resumes (",
            resume_columns!(),
            ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)"
        ))
        .bind(resume.id)
        .bind(resume.owner_id)
        .bind(&resume.name)
        .bind(&resume.profession)
        .bind(&resume.email)
        .bind(&resume.phone)
        .bind(&resume.linkedin)
        .bind(&resume.bio)
        .bind(&resume.skills)
        .bind(&resume.job_title)
        .bind(&resume.company)
        .bind(&resume.job_desc)
        .bind(&resume.degree)
        .bind(&resume.institute)
        .bind(&resume.grad_year)
        .bind(&resume.profile_pic_url)
        .bind(&resume.template)
        .bind(resume.created_at)
        .bind(resume.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<Resume>> {
        let resume = sqlx::query_as::<_, Resume>(concat!(
            "SELECT ",
            resume_columns!(),
            " FROM resumes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(resume)
    }

    pub async fn list_by_owner<'e, E: PgExecutor<'e>>(executor: E, owner: Uuid) -> Result<Vec<Resume>> {
        let resumes = sqlx::query_as::<_, Resume>(concat!(
            "SELECT ",
            resume_columns!(),
            " FROM resumes WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(executor)
        .await?;

        Ok(resumes)
    }

    pub async fn update<'e, E: PgExecutor<'e>>(executor: E, resume: &Resume) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET name = $2, profession = $3, email = $4, phone = $5, linkedin = $6, bio = $7,
                skills = $8, job_title = $9, company = $10, job_desc = $11, degree = $12,
                institute = $13, grad_year = $14, profile_pic_url = $15, template = $16,
                updated_at = $17
            WHERE id = $1
            "#,
        )
        .bind(resume.id)
        .bind(&resume.name)
        .bind(&resume.profession)
        .bind(&resume.email)
        .bind(&resume.phone)
        .bind(&resume.linkedin)
        .bind(&resume.bio)
        .bind(&resume.skills)
        .bind(&resume.job_title)
        .bind(&resume.company)
        .bind(&resume.job_desc)
        .bind(&resume.degree)
        .bind(&resume.institute)
        .bind(&resume.grad_year)
        .bind(&resume.profile_pic_url)
        .bind(&resume.template)
        .bind(resume.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Returns whether a row was deleted.
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct PurchaseQueries;

impl PurchaseQueries {
    pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, purchase: &Purchase) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO purchases (id, owner_id, amount, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(purchase.id)
        .bind(purchase.owner_id)
        .bind(purchase.amount)
        .bind(&purchase.description)
        .bind(purchase.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn list_by_owner<'e, E: PgExecutor<'e>>(
        executor: E,
        owner: Uuid,
    ) -> Result<Vec<Purchase>> {
        let purchases = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, owner_id, amount, description, created_at
            FROM purchases
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(executor)
        .await?;

        Ok(purchases)
    }
}
