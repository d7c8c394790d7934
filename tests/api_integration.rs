//! End-to-end API tests
//!
//! These tests drive the full Axum router against the in-memory store,
//! covering the session gate, template CRUD with audit logging, and the
//! public rendering endpoint.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use sewinggem_template_service::config::{JwtConfig, Settings};
use sewinggem_template_service::seed;
use sewinggem_template_service::server::{create_app, AppState};
use sewinggem_template_service::store::{AuditAction, MemoryStore, StoreBackend};

const ADMIN_USER: &str = "gemma";
const ADMIN_PASSWORD: &str = "changethispassword";

fn test_settings() -> Settings {
    Settings {
        server: Default::default(),
        database: Default::default(),
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            token_ttl_seconds: 60 * 60 * 24,
        },
        admin: Default::default(),
    }
}

/// Build the app with a seeded in-memory store.
async fn create_test_app() -> (Router, AppState, Arc<dyn StoreBackend>) {
    let settings = test_settings();
    let store: Arc<dyn StoreBackend> = Arc::new(MemoryStore::new());
    seed::run(&settings, &store).await.expect("seeding");

    let state = AppState::new(settings, store.clone());
    (create_app(state.clone()), state, store)
}

/// A valid session token presented as a bearer header.
fn auth_header(state: &AppState) -> String {
    format!("Bearer {}", state.jwt.issue(1, ADMIN_USER).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn request(method: &str, uri: &str, body: Value, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let (app, _, _) = create_test_app().await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/login",
            json!({"username": ADMIN_USER, "password": ADMIN_PASSWORD}),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("auth-token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], ADMIN_USER);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (app, _, _) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            json!({"username": ADMIN_USER, "password": "wrong"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/login",
            json!({"username": "nobody", "password": "whatever"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_session_cookie_grants_admin_access() {
    let (app, _, _) = create_test_app().await;

    let login = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            json!({"username": ADMIN_USER, "password": ADMIN_PASSWORD}),
            None,
        ))
        .await
        .unwrap();
    let cookie = login.headers().get(header::SET_COOKIE).unwrap().clone();
    // Only the name=value pair goes back to the server.
    let cookie_pair = cookie.to_str().unwrap().split(';').next().unwrap().to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/templates")
                .header(header::COOKIE, cookie_pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["templates"].is_array());
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (app, _, _) = create_test_app().await;

    let response = app
        .oneshot(request("POST", "/api/auth/logout", json!({}), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("auth-token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    let (app, _, _) = create_test_app().await;

    let response = app.clone().oneshot(get("/api/admin/templates")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body.get("templates").is_none());

    // A tampered token is just as unauthenticated as a missing one.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/templates")
                .header(header::AUTHORIZATION, "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Template CRUD
// =============================================================================

#[tokio::test]
async fn test_create_template_derives_slug_and_placeholders() {
    let (app, state, _) = create_test_app().await;
    let auth = auth_header(&state);

    let response = app
        .oneshot(request(
            "POST",
            "/api/admin/templates",
            json!({
                "name": "Order Shipped!",
                "content": "Hi {{CUSTOMER_NAME}}, order {{ORDER_NUMBER}} is on its way."
            }),
            Some(&auth),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["template"]["slug"], "order-shipped");
    assert_eq!(
        body["template"]["placeholders"],
        json!(["CUSTOMER_NAME", "ORDER_NUMBER"])
    );
}

#[tokio::test]
async fn test_create_rejects_duplicate_name() {
    let (app, state, _) = create_test_app().await;
    let auth = auth_header(&state);

    let first = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/admin/templates",
            json!({"name": "Team News", "content": "hello"}),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(request(
            "POST",
            "/api/admin/templates",
            json!({"name": "  team NEWS  ", "content": "different body"}),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let body = body_json(second).await;
    assert_eq!(body["error"], "A template with this name already exists");
}

#[tokio::test]
async fn test_create_validates_input() {
    let (app, state, _) = create_test_app().await;
    let auth = auth_header(&state);

    for payload in [
        json!({"name": "", "content": "body"}),
        json!({"name": "A Name", "content": ""}),
        json!({"name": "!!!", "content": "body"}),
        json!({"name": "x".repeat(256), "content": "body"}),
    ] {
        let response = app
            .clone()
            .oneshot(request("POST", "/api/admin/templates", payload, Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_get_template_by_id() {
    let (app, state, _) = create_test_app().await;
    let auth = auth_header(&state);

    let created = body_json(
        app.clone()
            .oneshot(request(
                "POST",
                "/api/admin/templates",
                json!({"name": "Lookup Me", "content": "body"}),
                Some(&auth),
            ))
            .await
            .unwrap(),
    )
    .await;
    let id = created["template"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/admin/templates/{}", id))
                .header(header::AUTHORIZATION, auth.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["template"]["name"], "Lookup Me");

    let missing = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/templates/999")
                .header(header::AUTHORIZATION, auth.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_regenerates_slug_and_placeholders() {
    let (app, state, _) = create_test_app().await;
    let auth = auth_header(&state);

    let created = body_json(
        app.clone()
            .oneshot(request(
                "POST",
                "/api/admin/templates",
                json!({"name": "Old Name", "content": "Hi {{CUSTOMER_NAME}}"}),
                Some(&auth),
            ))
            .await
            .unwrap(),
    )
    .await;
    let id = created["template"]["id"].as_i64().unwrap();

    // Rename only: the slug follows the name, content is untouched.
    let renamed = body_json(
        app.clone()
            .oneshot(request(
                "PUT",
                &format!("/api/admin/templates/{}", id),
                json!({"name": "New Name"}),
                Some(&auth),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(renamed["template"]["slug"], "new-name");
    assert_eq!(renamed["template"]["content"], "Hi {{CUSTOMER_NAME}}");

    // Content only: the placeholder set is re-derived.
    let rewritten = body_json(
        app.clone()
            .oneshot(request(
                "PUT",
                &format!("/api/admin/templates/{}", id),
                json!({"content": "no tokens anymore"}),
                Some(&auth),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(rewritten["template"]["placeholders"], Value::Null);

    // The old slug no longer resolves publicly; the new one does.
    let old_slug = app
        .clone()
        .oneshot(get("/api/templates/old-name"))
        .await
        .unwrap();
    assert_eq!(old_slug.status(), StatusCode::NOT_FOUND);

    let new_slug = app.oneshot(get("/api/templates/new-name")).await.unwrap();
    assert_eq!(new_slug.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_rejects_name_colliding_with_other_template() {
    let (app, state, _) = create_test_app().await;
    let auth = auth_header(&state);

    let mut beta_id = 0;
    for name in ["Alpha Report", "Beta Report"] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/admin/templates",
                json!({"name": name, "content": "body"}),
                Some(&auth),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        beta_id = body_json(response).await["template"]["id"].as_i64().unwrap();
    }
    let id = beta_id;

    // Stealing another template's name is a collision...
    let collision = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/admin/templates/{}", id),
            json!({"name": "Alpha Report"}),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(collision.status(), StatusCode::BAD_REQUEST);

    // ...but keeping your own name is not.
    let own_name = app
        .oneshot(request(
            "PUT",
            &format!("/api/admin/templates/{}", id),
            json!({"name": "Beta Report"}),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(own_name.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_template_removes_and_audits() {
    let (app, state, store) = create_test_app().await;
    let auth = auth_header(&state);

    let created = body_json(
        app.clone()
            .oneshot(request(
                "POST",
                "/api/admin/templates",
                json!({"name": "Doomed", "content": "body"}),
                Some(&auth),
            ))
            .await
            .unwrap(),
    )
    .await;
    let id = created["template"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/admin/templates/{}", id),
            json!({}),
            Some(&auth),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let gone = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/admin/templates/{}", id))
                .header(header::AUTHORIZATION, auth.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let trail = store.audit_trail(id).await.unwrap();
    let delete_entry = trail
        .iter()
        .find(|entry| entry.action == AuditAction::Delete)
        .expect("a DELETE audit entry should exist");
    assert_eq!(delete_entry.template_id, id);
    assert_eq!(delete_entry.template_name, "Doomed");
    assert_eq!(delete_entry.details["deletedBy"], ADMIN_USER);
}

// =============================================================================
// Public rendering
// =============================================================================

#[tokio::test]
async fn test_render_substitutes_query_values() {
    let (app, _, _) = create_test_app().await;

    let response = app
        .oneshot(get(
            "/api/templates/welcome?CUSTOMER_NAME=Jane&EMAIL=j%40x.com&WORKSHOP_DAY=Friday",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let template = &body["template"];
    assert_eq!(template["name"], "Welcome Email");

    let html = template["html"].as_str().unwrap();
    assert!(html.contains("Jane"));
    assert!(!html.contains("{{CUSTOMER_NAME}}"));
    assert!(html.contains("j@x.com"));

    assert_eq!(
        template["placeholders"],
        json!(["CUSTOMER_NAME", "EMAIL", "WORKSHOP_DAY"])
    );
}

#[tokio::test]
async fn test_render_leaves_unfilled_tokens_literal() {
    let (app, _, _) = create_test_app().await;

    let response = app
        .oneshot(get("/api/templates/welcome?CUSTOMER_NAME=Jane"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let content = body["template"]["content"].as_str().unwrap();
    assert!(!content.contains("{{CUSTOMER_NAME}}"));
    assert!(content.contains("{{EMAIL}}"));
    assert!(content.contains("{{WORKSHOP_DAY}}"));
}

#[tokio::test]
async fn test_render_sanitizes_html_output() {
    let (app, state, _) = create_test_app().await;
    let auth = auth_header(&state);

    app.clone()
        .oneshot(request(
            "POST",
            "/api/admin/templates",
            json!({
                "name": "Spicy Template",
                "content": "# Hi {{NAME}}\n\n<script>alert('x')</script>"
            }),
            Some(&auth),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get("/api/templates/spicy-template?NAME=%3Cb%3EJane%3C%2Fb%3E"))
        .await
        .unwrap();
    let body = body_json(response).await;

    let html = body["template"]["html"].as_str().unwrap();
    assert!(!html.contains("<script"));
    assert!(html.contains("Hi"));
}

#[tokio::test]
async fn test_render_unknown_slug_is_404() {
    let (app, _, _) = create_test_app().await;

    let response = app.oneshot(get("/api/templates/no-such-slug")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Template not found");
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_backend() {
    let (app, _, _) = create_test_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["backend"], "memory");
}
