//! Public template rendering endpoint.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use crate::error::AppError;
use crate::server::AppState;
use crate::template::{render_markdown, replace_placeholders};

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub success: bool,
    pub template: RenderedTemplate,
}

/// A template with the viewer's substitution values applied.
///
/// `content` is the substituted Markdown, `html` its sanitized rendering.
/// `placeholders` is the declared list, so a caller can detect which
/// tokens are still unfilled.
#[derive(Debug, Serialize)]
pub struct RenderedTemplate {
    pub name: String,
    pub content: String,
    pub html: String,
    pub placeholders: Option<Vec<String>>,
}

/// GET /api/templates/:slug - Render a template with query-supplied values
///
/// No session required. Query parameters are the substitution values;
/// tokens without a matching parameter stay literal in the output.
#[tracing::instrument(name = "http.render_template", skip(state, params))]
pub async fn render_template(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<RenderResponse>, AppError> {
    let template = state
        .store
        .find_template_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    let content = replace_placeholders(&template.content, &params);
    let html = render_markdown(&content);

    Ok(Json(RenderResponse {
        success: true,
        template: RenderedTemplate {
            name: template.name,
            content,
            html,
            placeholders: template.placeholders,
        },
    }))
}
