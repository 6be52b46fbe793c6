use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::{models::ResumeFields, services::llm_client::LlmError};

pub const BIO_SYSTEM_PROMPT: &str = "You are a professional copywriter for personal branding. \
     Avoid generic fluff. Keep it human and inspired.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BioProfile {
    pub name: String,
    pub profession: String,
    pub skills: String,
}

impl From<&ResumeFields> for BioProfile {
    fn from(fields: &ResumeFields) -> Self {
        Self {
            name: fields.name.clone(),
            profession: fields.profession.clone(),
            skills: fields.skills.split(',').collect::<Vec<_>>().join(", "),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BioResponse {
    pub bio: String,
}

/// Source of bio text for resumes submitted without one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BioWriter: Send + Sync {
    async fn write_bio(&self, profile: &BioProfile) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BioSource {
    Generated,
    Fallback,
}

impl BioSource {
    pub fn as_str(self) -> &'static str {
        match self {
            BioSource::Generated => "generated",
            BioSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenBio {
    pub text: String,
    pub source: BioSource,
}

pub fn bio_prompt(profile: &BioProfile) -> String {
    format!(
        "Write a first-person 2-3 sentence summary for a resume. \
         The person is named {}, a {}, skilled in {}. \
         The tone should be confident, creative, and slightly poetic, like a personal brand pitch. \
         Begin with 'I am' or 'I'm'. Mention how their skills come together to create functional and meaningful work.",
        profile.name, profile.profession, profile.skills
    )
}

pub fn fallback_bio(profile: &BioProfile) -> String {
    format!(
        "I'm {}, a {} skilled in {}, blending creativity and logic to craft meaningful work.",
        profile.name, profile.profession, profile.skills
    )
}

/// Asks the writer for a bio and falls back to a templated sentence on any failure.
pub async fn write_bio_or_fallback(writer: &dyn BioWriter, profile: &BioProfile) -> WrittenBio {
    match writer.write_bio(profile).await {
        Ok(text) if !text.trim().is_empty() => WrittenBio {
            text: text.trim().to_string(),
            source: BioSource::Generated,
        },
        Ok(_) => {
            warn!("Bio writer returned blank text, using fallback bio");
            fallback(profile)
        }
        Err(e) => {
            warn!(error = %e, "Bio writer failed, using fallback bio");
            fallback(profile)
        }
    }
}

fn fallback(profile: &BioProfile) -> WrittenBio {
    WrittenBio {
        text: fallback_bio(profile),
        source: BioSource::Fallback,
    }
}
