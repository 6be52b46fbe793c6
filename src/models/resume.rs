use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_TEMPLATE: &str = "classic";

/// Free-form profile fields as submitted by the resume form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ResumeFields {
    pub name: String,
    pub profession: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub bio: String,
    /// Comma separated.
    pub skills: String,
    pub job_title: String,
    pub company: String,
    pub job_desc: String,
    pub degree: String,
    pub institute: String,
    pub grad_year: String,
}

impl ResumeFields {
    /// Assigns a form field by name. Returns false for names that are not profile fields.
    pub fn set(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            "name" => &mut self.name,
            "profession" => &mut self.profession,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "linkedin" => &mut self.linkedin,
            "bio" => &mut self.bio,
            "skills" => &mut self.skills,
            "job_title" => &mut self.job_title,
            "company" => &mut self.company,
            "job_desc" => &mut self.job_desc,
            "degree" => &mut self.degree,
            "institute" => &mut self.institute,
            "grad_year" => &mut self.grad_year,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Splits a comma separated skill list, trimming entries and dropping blanks.
pub fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn normalize_skills(raw: &str) -> String {
    split_skills(raw).join(",")
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, ToSchema)]
pub struct Resume {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub profession: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub bio: String,
    pub skills: String,
    pub job_title: String,
    pub company: String,
    pub job_desc: String,
    pub degree: String,
    pub institute: String,
    pub grad_year: String,
    pub profile_pic_url: Option<String>,
    pub template: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resume {
    pub fn fields(&self) -> ResumeFields {
        ResumeFields {
            name: self.name.clone(),
            profession: self.profession.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            linkedin: self.linkedin.clone(),
            bio: self.bio.clone(),
            skills: self.skills.clone(),
            job_title: self.job_title.clone(),
            company: self.company.clone(),
            job_desc: self.job_desc.clone(),
            degree: self.degree.clone(),
            institute: self.institute.clone(),
            grad_year: self.grad_year.clone(),
        }
    }

    fn set_fields(&mut self, fields: ResumeFields) {
        self.name = fields.name;
        self.profession = fields.profession;
        self.email = fields.email;
        self.phone = fields.phone;
        self.linkedin = fields.linkedin;
        self.bio = fields.bio;
        self.skills = fields.skills;
        self.job_title = fields.job_title;
        self.company = fields.company;
        self.job_desc = fields.job_desc;
        self.degree = fields.degree;
        self.institute = fields.institute;
        self.grad_year = fields.grad_year;
    }

    /// Applies an edit. The picture is only replaced when the edit carries a new one.
    pub fn apply(&mut self, edit: ResumeEdit, now: DateTime<Utc>) {
        self.set_fields(edit.fields);
        self.template = edit.template;
        if let Some(url) = edit.profile_pic_url {
            self.profile_pic_url = Some(url);
        }
        self.updated_at = now;
    }

    pub fn render_context(&self) -> RenderContext {
        RenderContext {
            template: self.template.clone(),
            name: self.name.clone(),
            profession: self.profession.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            linkedin: self.linkedin.clone(),
            bio: self.bio.clone(),
            skills: split_skills(&self.skills),
            job_title: self.job_title.clone(),
            company: self.company.clone(),
            job_desc: self.job_desc.clone(),
            degree: self.degree.clone(),
            institute: self.institute.clone(),
            grad_year: self.grad_year.clone(),
            profile_pic_url: self.profile_pic_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub owner_id: Uuid,
    pub fields: ResumeFields,
    pub template: String,
    pub profile_pic_url: Option<String>,
}

impl NewResume {
    pub fn into_resume(self, id: Uuid, now: DateTime<Utc>) -> Resume {
        let mut resume = Resume {
            id,
            owner_id: self.owner_id,
            name: String::new(),
            profession: String::new(),
            email: String::new(),
            phone: String::new(),
            linkedin: String::new(),
            bio: String::new(),
            skills: String::new(),
            job_title: String::new(),
            company: String::new(),
            job_desc: String::new(),
            degree: String::new(),
            institute: String::new(),
            grad_year: String::new(),
            profile_pic_url: self.profile_pic_url,
            template: self.template,
            created_at: now,
            updated_at: now,
        };
        resume.set_fields(self.fields);
        resume
    }
}

impl From<&Resume> for NewResume {
    fn from(resume: &Resume) -> Self {
        Self {
            owner_id: resume.owner_id,
            fields: resume.fields(),
            template: resume.template.clone(),
            profile_pic_url: resume.profile_pic_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResumeEdit {
    pub fields: ResumeFields,
    pub template: String,
    pub profile_pic_url: Option<String>,
}

/// Everything a template renderer needs to draw a resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RenderContext {
    pub template: String,
    pub name: String,
    pub profession: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub job_title: String,
    pub company: String,
    pub job_desc: String,
    pub degree: String,
    pub institute: String,
    pub grad_year: String,
    pub profile_pic_url: Option<String>,
}
