use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{require_session, AppState};

use super::admin::{
    create_template, delete_template, get_template, list_templates, update_template,
};
use super::auth::{login, logout};
use super::health::health;
use super::public::render_template;

pub fn api_routes(state: AppState) -> Router<AppState> {
    // Admin CRUD sits behind the session gate; everything else is public.
    let admin_routes = Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route(
            "/templates/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        // Health
        .route("/health", get(health))
        // Session endpoints
        .nest(
            "/api/auth",
            Router::new()
                .route("/login", post(login))
                .route("/logout", post(logout)),
        )
        // Template authoring
        .nest("/api/admin", admin_routes)
        // Public rendering
        .route("/api/templates/{slug}", get(render_template))
}
