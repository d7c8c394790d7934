//! Backend trait for template, admin, and audit-log storage.
//!
//! This module defines the abstraction layer for the persistent store,
//! allowing different implementations (memory, PostgreSQL) to be used
//! interchangeably.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::template::{NewTemplate, Template, TemplateChanges};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The derived slug collides with another template
    #[error("Slug already in use: {0}")]
    DuplicateSlug(String),

    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Migration failed
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A provisioned admin account.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// What happened to a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }

    /// Key used in the details payload for the acting username.
    fn actor_key(&self) -> &'static str {
        match self {
            AuditAction::Create => "createdBy",
            AuditAction::Update => "updatedBy",
            AuditAction::Delete => "deletedBy",
        }
    }
}

/// An immutable record of a create/update/delete action against a template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub action: AuditAction,
    pub template_id: i64,
    /// Denormalized snapshot of the template name at action time
    pub template_name: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Build the free-form details payload recording the acting username.
pub fn audit_details(action: AuditAction, actor: &str) -> serde_json::Value {
    serde_json::json!({ action.actor_key(): actor })
}

/// Backend trait for the template store.
///
/// Implementations must be thread-safe (`Send + Sync`) as they are shared
/// across request handlers.
///
/// Template mutations append a matching audit entry; the PostgreSQL
/// implementation performs both writes in a single transaction so a
/// persisted mutation always has its audit record.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Backend type identifier for health reporting.
    fn backend_type(&self) -> &'static str;

    /// Insert a new template and record a CREATE audit entry.
    ///
    /// Fails with [`StoreError::DuplicateSlug`] when the slug is taken.
    async fn create_template(
        &self,
        new: NewTemplate,
        actor: &str,
    ) -> Result<Template, StoreError>;

    /// Apply a partial update and record an UPDATE audit entry.
    ///
    /// Returns `None` when no template has the given id.
    async fn update_template(
        &self,
        id: i64,
        changes: TemplateChanges,
        actor: &str,
    ) -> Result<Option<Template>, StoreError>;

    /// Delete a template and record a DELETE audit entry.
    ///
    /// Returns the removed template, `None` when the id is unknown.
    async fn delete_template(&self, id: i64, actor: &str) -> Result<Option<Template>, StoreError>;

    /// All templates, most recently updated first.
    async fn list_templates(&self) -> Result<Vec<Template>, StoreError>;

    async fn find_template(&self, id: i64) -> Result<Option<Template>, StoreError>;

    async fn find_template_by_slug(&self, slug: &str) -> Result<Option<Template>, StoreError>;

    /// Whether a slug is already used by a template other than `exclude_id`.
    async fn slug_in_use(&self, slug: &str, exclude_id: Option<i64>)
        -> Result<bool, StoreError>;

    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>, StoreError>;

    /// Create the admin account if absent; an existing account (and its
    /// password hash) is left untouched.
    async fn upsert_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminUser, StoreError>;

    /// Audit entries for a template, oldest first.
    async fn audit_trail(&self, template_id: i64) -> Result<Vec<AuditEntry>, StoreError>;

    /// Release backing resources at shutdown.
    async fn close(&self);
}
