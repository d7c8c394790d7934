//! In-memory store backend using DashMap.
//!
//! Records are held in memory and lost on restart. Used for tests and as
//! the fallback when no database is configured.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::template::{NewTemplate, Template, TemplateChanges};

use super::backend::{
    audit_details, AdminUser, AuditAction, AuditEntry, StoreBackend, StoreError,
};

/// In-memory store backend.
///
/// Uses `DashMap` for concurrent access to templates and admins; the audit
/// log is an append-only `Vec` behind a mutex.
pub struct MemoryStore {
    templates: DashMap<i64, Template>,
    admins: DashMap<String, AdminUser>,
    audit_log: Mutex<Vec<AuditEntry>>,
    next_template_id: AtomicI64,
    next_admin_id: AtomicI64,
    next_audit_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
            admins: DashMap::new(),
            audit_log: Mutex::new(Vec::new()),
            next_template_id: AtomicI64::new(1),
            next_admin_id: AtomicI64::new(1),
            next_audit_id: AtomicI64::new(1),
        }
    }

    fn append_audit(&self, action: AuditAction, template_id: i64, name: &str, actor: &str) {
        let entry = AuditEntry {
            id: self.next_audit_id.fetch_add(1, Ordering::SeqCst),
            action,
            template_id,
            template_name: name.to_string(),
            details: audit_details(action, actor),
            created_at: Utc::now(),
        };
        self.audit_log.lock().expect("audit log lock").push(entry);
    }

    fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> bool {
        self.templates
            .iter()
            .any(|entry| entry.slug == slug && Some(entry.id) != exclude_id)
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn create_template(
        &self,
        new: NewTemplate,
        actor: &str,
    ) -> Result<Template, StoreError> {
        if self.slug_taken(&new.slug, None) {
            return Err(StoreError::DuplicateSlug(new.slug));
        }

        let now = Utc::now();
        let id = self.next_template_id.fetch_add(1, Ordering::SeqCst);
        let template = Template {
            id,
            slug: new.slug,
            name: new.name,
            content: new.content,
            placeholders: new.placeholders,
            created_at: now,
            updated_at: now,
        };

        self.templates.insert(id, template.clone());
        self.append_audit(AuditAction::Create, id, &template.name, actor);

        Ok(template)
    }

    async fn update_template(
        &self,
        id: i64,
        changes: TemplateChanges,
        actor: &str,
    ) -> Result<Option<Template>, StoreError> {
        if let Some(slug) = &changes.slug {
            if self.slug_taken(slug, Some(id)) {
                return Err(StoreError::DuplicateSlug(slug.clone()));
            }
        }

        let updated = match self.templates.get_mut(&id) {
            Some(mut entry) => {
                if let Some(name) = changes.name {
                    entry.name = name;
                }
                if let Some(slug) = changes.slug {
                    entry.slug = slug;
                }
                if let Some(content) = changes.content {
                    entry.content = content;
                }
                if let Some(placeholders) = changes.placeholders {
                    entry.placeholders = placeholders;
                }
                entry.updated_at = Utc::now();
                entry.clone()
            }
            None => return Ok(None),
        };

        self.append_audit(AuditAction::Update, id, &updated.name, actor);

        Ok(Some(updated))
    }

    async fn delete_template(&self, id: i64, actor: &str) -> Result<Option<Template>, StoreError> {
        match self.templates.remove(&id) {
            Some((_, template)) => {
                self.append_audit(AuditAction::Delete, id, &template.name, actor);
                Ok(Some(template))
            }
            None => Ok(None),
        }
    }

    async fn list_templates(&self) -> Result<Vec<Template>, StoreError> {
        let mut templates: Vec<Template> = self
            .templates
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        templates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(templates)
    }

    async fn find_template(&self, id: i64) -> Result<Option<Template>, StoreError> {
        Ok(self.templates.get(&id).map(|entry| entry.clone()))
    }

    async fn find_template_by_slug(&self, slug: &str) -> Result<Option<Template>, StoreError> {
        Ok(self
            .templates
            .iter()
            .find(|entry| entry.slug == slug)
            .map(|entry| entry.value().clone()))
    }

    async fn slug_in_use(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, StoreError> {
        Ok(self.slug_taken(slug, exclude_id))
    }

    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>, StoreError> {
        Ok(self.admins.get(username).map(|entry| entry.clone()))
    }

    async fn upsert_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminUser, StoreError> {
        let admin = self
            .admins
            .entry(username.to_string())
            .or_insert_with(|| AdminUser {
                id: self.next_admin_id.fetch_add(1, Ordering::SeqCst),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            })
            .clone();
        Ok(admin)
    }

    async fn audit_trail(&self, template_id: i64) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self
            .audit_log
            .lock()
            .expect("audit log lock")
            .iter()
            .filter(|entry| entry.template_id == template_id)
            .cloned()
            .collect())
    }

    async fn close(&self) {}
}
