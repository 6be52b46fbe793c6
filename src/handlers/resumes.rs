use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::AuthenticatedUser,
    models::{AccountResponse, RenderContext, Resume, ResumeEdit, ResumeFields, DEFAULT_TEMPLATE},
    services::generation::{authorize_template, clean_fields, validate_fields, GenerationRequest},
    storage::{discard_upload, save_profile_picture, ProfilePicture},
};

pub const PROFILE_PIC_FIELD: &str = "profile_pic";

/// A submitted resume form.
#[derive(Debug, Default)]
pub struct ResumeForm {
    pub template: Option<String>,
    pub fields: ResumeFields,
    pub profile_pic: Option<ProfilePicture>,
}

fn bad_form(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid form data: {}", e))
}

pub async fn parse_resume_form(mut multipart: Multipart) -> Result<ResumeForm> {
    let mut form = ResumeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            PROFILE_PIC_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(bad_form)?;

                // Browsers send an empty part for an untouched file input.
                if !filename.is_empty() && !data.is_empty() {
                    form.profile_pic = Some(ProfilePicture {
                        filename,
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            "template" => {
                let value = field.text().await.map_err(bad_form)?;
                let value = value.trim();
                if !value.is_empty() {
                    form.template = Some(value.to_string());
                }
            }
            _ => {
                let value = field.text().await.map_err(bad_form)?;
                if !form.fields.set(&name, value) {
                    tracing::debug!(field = %name, "Ignoring unknown form field");
                }
            }
        }
    }

    Ok(form)
}

fn resume_body(resume: &Resume) -> serde_json::Value {
    json!({
        "resume": resume,
        "render_context": resume.render_context()
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/resumes/generate",
    request_body(content = ResumeFields, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Resume generated"),
        (status = 400, description = "Missing name or profession"),
        (status = 402, description = "Out of tokens"),
        (status = 403, description = "Template requires a paid plan"),
        (status = 429, description = "Rate limit exceeded")
    ),
    security(("bearer_auth" = [])),
    tag = "resumes"
)]
pub async fn generate_resume(
    State(state): State<AppState>,
    AuthenticatedUser { mut account }: AuthenticatedUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let form = parse_resume_form(multipart).await?;
    let request = GenerationRequest {
        template: form.template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
        fields: form.fields,
        profile_pic: form.profile_pic,
    };

    let resume = state
        .generation()
        .generate(&mut account, request, Utc::now())
        .await?;

    let mut body = resume_body(&resume);
    body["account"] = json!(AccountResponse::from(&account));

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Resume generated successfully",
            "data": body
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/resumes",
    responses((status = 200, description = "Caller's resumes, newest first", body = [Resume])),
    security(("bearer_auth" = [])),
    tag = "resumes"
)]
pub async fn list_resumes(
    State(state): State<AppState>,
    AuthenticatedUser { account }: AuthenticatedUser,
) -> Result<Json<serde_json::Value>> {
    let resumes = state.store.list_resumes(account.id).await?;

    Ok(Json(json!({
        "data": resumes
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/resumes/{id}",
    params(("id" = Uuid, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Resume and its render context"),
        (status = 403, description = "Resume belongs to another account"),
        (status = 404, description = "Resume not found")
    ),
    security(("bearer_auth" = [])),
    tag = "resumes"
)]
pub async fn view_resume(
    State(state): State<AppState>,
    AuthenticatedUser { account }: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let resume = state.store.resume_for_owner(account.id, id).await?;

    Ok(Json(json!({
        "data": resume_body(&resume)
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/resumes/{id}",
    params(("id" = Uuid, Path, description = "Resume id")),
    request_body(content = ResumeFields, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Resume updated"),
        (status = 400, description = "Missing name or profession"),
        (status = 403, description = "Template not allowed or resume not owned"),
        (status = 404, description = "Resume not found")
    ),
    security(("bearer_auth" = [])),
    tag = "resumes"
)]
pub async fn edit_resume(
    State(state): State<AppState>,
    AuthenticatedUser { account }: AuthenticatedUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>> {
    // Ownership is settled before anything is written.
    let existing = state.store.resume_for_owner(account.id, id).await?;
    let form = parse_resume_form(multipart).await?;

    let template = form.template.unwrap_or(existing.template);
    authorize_template(&state.policy, &account, &template)?;
    validate_fields(&form.fields)?;

    let upload = match form.profile_pic {
        Some(picture) => Some(
            save_profile_picture(state.storage.as_ref(), &state.upload_rules, &picture).await?,
        ),
        None => None,
    };

    let updated = state
        .store
        .update_resume(
            account.id,
            id,
            ResumeEdit {
                fields: clean_fields(form.fields),
                template,
                profile_pic_url: upload.as_ref().map(|u| u.url.clone()),
            },
        )
        .await;

    let resume = match updated {
        Ok(resume) => resume,
        Err(e) => {
            if let Some(upload) = &upload {
                discard_upload(state.storage.as_ref(), upload).await;
            }
            return Err(e);
        }
    };

    tracing::info!(account_id = %account.id, resume_id = %resume.id, "Resume updated");

    Ok(Json(json!({
        "message": "Resume updated successfully",
        "data": resume_body(&resume)
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/resumes/{id}/duplicate",
    params(("id" = Uuid, Path, description = "Resume id")),
    responses(
        (status = 201, description = "Copy created"),
        (status = 403, description = "Resume belongs to another account"),
        (status = 404, description = "Resume not found")
    ),
    security(("bearer_auth" = [])),
    tag = "resumes"
)]
pub async fn duplicate_resume(
    State(state): State<AppState>,
    AuthenticatedUser { account }: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let copy = state.store.duplicate_resume(account.id, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Resume duplicated successfully",
            "data": resume_body(&copy)
        })),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/resumes/{id}",
    params(("id" = Uuid, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Resume deleted"),
        (status = 403, description = "Resume belongs to another account"),
        (status = 404, description = "Resume not found")
    ),
    security(("bearer_auth" = [])),
    tag = "resumes"
)]
pub async fn delete_resume(
    State(state): State<AppState>,
    AuthenticatedUser { account }: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.store.delete_resume(account.id, id).await?;
    tracing::info!(account_id = %account.id, resume_id = %id, "Resume deleted");

    Ok(Json(json!({
        "message": "Resume deleted successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/resumes/{id}/download",
    params(("id" = Uuid, Path, description = "Resume id")),
    responses(
        (status = 200, description = "Render context as a JSON attachment", body = RenderContext),
        (status = 403, description = "Resume belongs to another account"),
        (status = 404, description = "Resume not found")
    ),
    security(("bearer_auth" = [])),
    tag = "resumes"
)]
pub async fn download_resume(
    State(state): State<AppState>,
    AuthenticatedUser { account }: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let resume = state.store.resume_for_owner(account.id, id).await?;
    let disposition = format!("attachment; filename=\"resume-{}.json\"", resume.id);

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Json(resume.render_context()),
    )
        .into_response())
}
