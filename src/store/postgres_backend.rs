//! PostgreSQL store backend.
//!
//! Templates, admin users, and the append-only audit log live in three
//! tables (see `migrations/`). Placeholder lists are stored as JSONB.
//! Each template mutation and its audit entry are written in a single
//! transaction, so a persisted mutation always has a matching audit record.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, Row, Transaction};

use crate::config::DatabaseConfig;
use crate::template::{NewTemplate, Template, TemplateChanges};

use super::backend::{
    audit_details, AdminUser, AuditAction, AuditEntry, StoreBackend, StoreError,
};

const TEMPLATE_COLUMNS: &str = "id, slug, name, content, placeholders, created_at, updated_at";

/// PostgreSQL store backend.
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: i64,
    slug: String,
    name: String,
    content: String,
    placeholders: Option<Json<Vec<String>>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TemplateRow> for Template {
    fn from(row: TemplateRow) -> Self {
        Template {
            id: row.id,
            slug: row.slug,
            name: row.name,
            content: row.content,
            placeholders: row.placeholders.map(|Json(p)| p),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i64,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<AdminRow> for AdminUser {
    fn from(row: AdminRow) -> Self {
        AdminUser {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

impl PostgresStore {
    /// Connect to PostgreSQL and run pending migrations.
    pub async fn connect(config: &DatabaseConfig, url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .connect(url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!(
            pool_size = config.pool_size,
            "PostgreSQL connection pool created"
        );

        Ok(Self { pool })
    }

    async fn insert_audit(
        tx: &mut Transaction<'_, Postgres>,
        action: AuditAction,
        template_id: i64,
        template_name: &str,
        actor: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_log (action, template_id, template_name, details) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(action.as_str())
        .bind(template_id)
        .bind(template_name)
        .bind(audit_details(action, actor))
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

/// Map a unique-constraint violation on the slug column to `DuplicateSlug`.
fn map_insert_error(err: sqlx::Error, slug: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::DuplicateSlug(slug.to_string());
        }
    }
    StoreError::Postgres(err)
}

#[async_trait]
impl StoreBackend for PostgresStore {
    fn backend_type(&self) -> &'static str {
        "postgres"
    }

    async fn create_template(
        &self,
        new: NewTemplate,
        actor: &str,
    ) -> Result<Template, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: TemplateRow = sqlx::query_as(&format!(
            "INSERT INTO templates (slug, name, content, placeholders) \
             VALUES ($1, $2, $3, $4) RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(&new.slug)
        .bind(&new.name)
        .bind(&new.content)
        .bind(new.placeholders.map(Json))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, &new.slug))?;

        Self::insert_audit(&mut tx, AuditAction::Create, row.id, &row.name, actor).await?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn update_template(
        &self,
        id: i64,
        changes: TemplateChanges,
        actor: &str,
    ) -> Result<Option<Template>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let slug_for_error = changes.slug.clone().unwrap_or_default();
        let set_placeholders = changes.placeholders.is_some();
        let placeholders = changes.placeholders.flatten().map(Json);

        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            "UPDATE templates SET \
               name = COALESCE($2, name), \
               slug = COALESCE($3, slug), \
               content = COALESCE($4, content), \
               placeholders = CASE WHEN $5 THEN $6 ELSE placeholders END, \
               updated_at = NOW() \
             WHERE id = $1 RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.slug)
        .bind(changes.content)
        .bind(set_placeholders)
        .bind(placeholders)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, &slug_for_error))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Self::insert_audit(&mut tx, AuditAction::Update, row.id, &row.name, actor).await?;
        tx.commit().await?;

        Ok(Some(row.into()))
    }

    async fn delete_template(&self, id: i64, actor: &str) -> Result<Option<Template>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            "DELETE FROM templates WHERE id = $1 RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Self::insert_audit(&mut tx, AuditAction::Delete, row.id, &row.name, actor).await?;
        tx.commit().await?;

        Ok(Some(row.into()))
    }

    async fn list_templates(&self) -> Result<Vec<Template>, StoreError> {
        let rows: Vec<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates ORDER BY updated_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Template::from).collect())
    }

    async fn find_template(&self, id: i64) -> Result<Option<Template>, StoreError> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Template::from))
    }

    async fn find_template_by_slug(&self, slug: &str) -> Result<Option<Template>, StoreError> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Template::from))
    }

    async fn slug_in_use(
        &self,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, StoreError> {
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS( \
               SELECT 1 FROM templates \
               WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(in_use)
    }

    async fn find_admin(&self, username: &str) -> Result<Option<AdminUser>, StoreError> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at \
             FROM admin_users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AdminUser::from))
    }

    async fn upsert_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminUser, StoreError> {
        // The no-op DO UPDATE makes RETURNING yield the existing row without
        // touching its password hash.
        let row: AdminRow = sqlx::query_as(
            "INSERT INTO admin_users (username, password_hash) VALUES ($1, $2) \
             ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username \
             RETURNING id, username, password_hash, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn audit_trail(&self, template_id: i64) -> Result<Vec<AuditEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, action, template_id, template_name, details, created_at \
             FROM audit_log WHERE template_id = $1 ORDER BY created_at, id",
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<AuditEntry, StoreError> {
                let action: String = row.try_get("action")?;
                let action: AuditAction =
                    serde_json::from_value(serde_json::Value::String(action))?;
                Ok(AuditEntry {
                    id: row.try_get("id")?,
                    action,
                    template_id: row.try_get("template_id")?,
                    template_name: row.try_get("template_name")?,
                    details: row.try_get("details")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}
