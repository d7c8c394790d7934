//! Startup provisioning: the admin account and the sample template.
//!
//! Admin accounts are not self-service; the single author account comes
//! from configuration. The sample "Welcome Email" template gives a fresh
//! deployment something to render.

use std::sync::Arc;

use crate::auth::hash_password;
use crate::config::Settings;
use crate::error::AppError;
use crate::store::StoreBackend;
use crate::template::{extract_placeholders, placeholders_or_none, NewTemplate};

const WELCOME_SLUG: &str = "welcome";
const WELCOME_NAME: &str = "Welcome Email";
const WELCOME_CONTENT: &str = r#"# Welcome to SewingGem!

Dear {{CUSTOMER_NAME}},

Thank you for joining our sewing community! We're thrilled to have you as part of the SewingGem family.

Your account has been successfully created with the email: {{EMAIL}}.

## What's Next?

- Browse our collection of patterns and tutorials
- Join our online workshops every {{WORKSHOP_DAY}}
- Connect with fellow sewing enthusiasts in our community forum

If you have any questions, please don't hesitate to reach out to our support team.

Happy sewing!

Best regards,
The SewingGem Team"#;

/// Ensure the admin account exists and seed the sample template.
///
/// An existing admin account keeps its password hash; an existing
/// `welcome` template is left untouched.
pub async fn run(settings: &Settings, store: &Arc<dyn StoreBackend>) -> Result<(), AppError> {
    let hash = hash_password(&settings.admin.password)
        .map_err(|e| AppError::Internal(format!("Failed to hash admin password: {}", e)))?;

    let admin = store.upsert_admin(&settings.admin.username, &hash).await?;
    tracing::info!(username = %admin.username, "Admin user ready");

    if !settings.admin.seed_sample_template {
        return Ok(());
    }

    if store.find_template_by_slug(WELCOME_SLUG).await?.is_none() {
        let placeholders = placeholders_or_none(extract_placeholders(WELCOME_CONTENT));
        store
            .create_template(
                NewTemplate {
                    slug: WELCOME_SLUG.to_string(),
                    name: WELCOME_NAME.to_string(),
                    content: WELCOME_CONTENT.to_string(),
                    placeholders,
                },
                &admin.username,
            )
            .await?;
        tracing::info!(slug = WELCOME_SLUG, "Sample template created");
    }

    Ok(())
}
