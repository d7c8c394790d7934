//! Session-gated template CRUD endpoints.
//!
//! Every mutation derives the slug and placeholder set server-side from the
//! submitted name/content and appends an audit entry tagged with the acting
//! admin's username.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::Claims;
use crate::error::AppError;
use crate::server::AppState;
use crate::template::{
    extract_placeholders, placeholders_or_none, slugify, NewTemplate, Template, TemplateChanges,
};

const MAX_NAME_CHARS: usize = 255;

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub success: bool,
    pub templates: Vec<Template>,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub success: bool,
    pub template: Template,
}

#[derive(Debug, Serialize)]
pub struct DeleteTemplateResponse {
    pub success: bool,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let chars = name.chars().count();
    if chars == 0 || chars > MAX_NAME_CHARS {
        return Err(AppError::Validation(
            "Template name must be 1-255 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), AppError> {
    if content.is_empty() {
        return Err(AppError::Validation(
            "Template content must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Derive the slug for a name, rejecting names that reduce to nothing.
fn derive_slug(name: &str) -> Result<String, AppError> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(AppError::Validation(
            "Template name must contain at least one letter or number".to_string(),
        ));
    }
    Ok(slug)
}

fn duplicate_name_error() -> AppError {
    AppError::Validation("A template with this name already exists".to_string())
}

/// GET /api/admin/templates - List all templates
#[tracing::instrument(name = "http.list_templates", skip(state))]
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<TemplateListResponse>, AppError> {
    let templates = state.store.list_templates().await?;

    Ok(Json(TemplateListResponse {
        success: true,
        templates,
    }))
}

/// POST /api/admin/templates - Create a new template
#[tracing::instrument(name = "http.create_template", skip(state, claims, request))]
pub async fn create_template(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<Json<TemplateResponse>, AppError> {
    validate_name(&request.name)?;
    validate_content(&request.content)?;

    let slug = derive_slug(&request.name)?;
    if state.store.slug_in_use(&slug, None).await? {
        return Err(duplicate_name_error());
    }

    let placeholders = placeholders_or_none(extract_placeholders(&request.content));

    let template = state
        .store
        .create_template(
            NewTemplate {
                slug,
                name: request.name,
                content: request.content,
                placeholders,
            },
            &claims.username,
        )
        .await?;

    tracing::info!(
        template_id = template.id,
        slug = %template.slug,
        "Template created"
    );

    Ok(Json(TemplateResponse {
        success: true,
        template,
    }))
}

/// GET /api/admin/templates/:id - Get a single template
#[tracing::instrument(name = "http.get_template", skip(state))]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TemplateResponse>, AppError> {
    let template = state
        .store
        .find_template(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    Ok(Json(TemplateResponse {
        success: true,
        template,
    }))
}

/// PUT /api/admin/templates/:id - Partially update a template
///
/// A changed name regenerates the slug; changed content regenerates the
/// placeholder set.
#[tracing::instrument(name = "http.update_template", skip(state, claims, request))]
pub async fn update_template(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<Json<TemplateResponse>, AppError> {
    let mut changes = TemplateChanges::default();

    if let Some(name) = request.name {
        validate_name(&name)?;
        let slug = derive_slug(&name)?;
        if state.store.slug_in_use(&slug, Some(id)).await? {
            return Err(duplicate_name_error());
        }
        changes.name = Some(name);
        changes.slug = Some(slug);
    }

    if let Some(content) = request.content {
        validate_content(&content)?;
        changes.placeholders = Some(placeholders_or_none(extract_placeholders(&content)));
        changes.content = Some(content);
    }

    let template = state
        .store
        .update_template(id, changes, &claims.username)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    tracing::info!(
        template_id = template.id,
        slug = %template.slug,
        "Template updated"
    );

    Ok(Json(TemplateResponse {
        success: true,
        template,
    }))
}

/// DELETE /api/admin/templates/:id - Delete a template
#[tracing::instrument(name = "http.delete_template", skip(state, claims))]
pub async fn delete_template(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteTemplateResponse>, AppError> {
    let deleted = state
        .store
        .delete_template(id, &claims.username)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    tracing::info!(
        template_id = deleted.id,
        slug = %deleted.slug,
        "Template deleted"
    );

    Ok(Json(DeleteTemplateResponse { success: true }))
}
