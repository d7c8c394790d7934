//! Template records and change sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored email template.
///
/// `slug` is derived from `name` and unique across all templates.
/// `placeholders` is always exactly the set of distinct placeholder tokens
/// found in `content` at last save, `None` when the content has none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub content: String,
    pub placeholders: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new template. Slug and placeholders are derived
/// by the caller before the store is touched.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub slug: String,
    pub name: String,
    pub content: String,
    pub placeholders: Option<Vec<String>>,
}

/// Partial update for an existing template.
///
/// `name`/`slug` travel together (a renamed template gets a fresh slug),
/// as do `content`/`placeholders`.
#[derive(Debug, Clone, Default)]
pub struct TemplateChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub placeholders: Option<Option<Vec<String>>>,
}

impl TemplateChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.content.is_none()
    }
}
