use chrono::{DateTime, Utc};

use crate::{
    database::ResumeStore,
    errors::{AppError, Result},
    models::{normalize_skills, Account, NewResume, Resume, ResumeFields},
    services::{
        bio::{write_bio_or_fallback, BioProfile, BioWriter},
        metrics::MetricsService,
        quota::{self, QuotaPolicy},
        rate_limiter::{self, RequestGate, GENERATE_SCOPE},
    },
    storage::{discard_upload, save_profile_picture, ProfilePicture, Storage, UploadRules},
};

/// Rejects unknown templates and premium templates the plan does not unlock.
pub fn authorize_template(policy: &QuotaPolicy, account: &Account, template: &str) -> Result<()> {
    if !policy.is_known_template(template) {
        return Err(AppError::Validation(format!("Unknown template: {}", template)));
    }
    if !policy.can_use_template(account, template) {
        return Err(AppError::TemplateNotAllowed);
    }
    Ok(())
}

/// A resume needs at least a name and a profession.
pub fn validate_fields(fields: &ResumeFields) -> Result<()> {
    for (label, value) in [("Name", &fields.name), ("Profession", &fields.profession)] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", label)));
        }
    }
    Ok(())
}

/// Trims the bio and normalizes the skill list of submitted form fields.
pub fn clean_fields(mut fields: ResumeFields) -> ResumeFields {
    fields.name = fields.name.trim().to_string();
    fields.profession = fields.profession.trim().to_string();
    fields.skills = normalize_skills(&fields.skills);
    fields.bio = fields.bio.trim().to_string();
    fields
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub template: String,
    pub fields: ResumeFields,
    pub profile_pic: Option<ProfilePicture>,
}

/// Creates a resume for an account, charging one token.
pub struct GenerationWorkflow<'a> {
    pub store: &'a dyn ResumeStore,
    pub storage: &'a dyn Storage,
    pub bio_writer: &'a dyn BioWriter,
    pub policy: &'a QuotaPolicy,
    pub upload_rules: &'a UploadRules,
    pub metrics: &'a MetricsService,
    pub gate: Option<&'a dyn RequestGate>,
}

impl GenerationWorkflow<'_> {
    pub async fn generate(
        &self,
        account: &mut Account,
        request: GenerationRequest,
        now: DateTime<Utc>,
    ) -> Result<Resume> {
        // A refill is kept even when the request is rejected below.
        if quota::reset_if_needed(account, now) {
            self.store.save_account(account).await?;
        }

        let GenerationRequest {
            template,
            fields,
            profile_pic,
        } = request;

        authorize_template(self.policy, account, &template)?;
        if !quota::has_tokens(account) {
            return Err(AppError::OutOfTokens);
        }
        validate_fields(&fields)?;

        // Only requests that will be served count against the AI limit.
        rate_limiter::admit(self.gate, account.id, GENERATE_SCOPE).await?;

        let upload = match profile_pic {
            Some(picture) => {
                Some(save_profile_picture(self.storage, self.upload_rules, &picture).await?)
            }
            None => None,
        };

        let mut fields = clean_fields(fields);
        if fields.bio.is_empty() {
            let written = write_bio_or_fallback(self.bio_writer, &BioProfile::from(&fields)).await;
            self.metrics.record_bio(written.source);
            fields.bio = written.text;
        }

        let before = account.clone();
        quota::deduct_token(account);
        account.last_generated = Some(now);

        let committed = self
            .store
            .commit_generation(
                account,
                NewResume {
                    owner_id: account.id,
                    fields,
                    template,
                    profile_pic_url: upload.as_ref().map(|u| u.url.clone()),
                },
            )
            .await;

        let resume = match committed {
            Ok(resume) => resume,
            Err(e) => {
                *account = before;
                if let Some(upload) = &upload {
                    discard_upload(self.storage, upload).await;
                }
                return Err(e);
            }
        };

        self.metrics.record_generation();
        tracing::info!(
            account_id = %account.id,
            resume_id = %resume.id,
            template = %resume.template,
            tokens_left = account.tokens,
            "Resume generated"
        );

        Ok(resume)
    }
}
