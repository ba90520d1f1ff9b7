//! # esc-api — HTTP Surface for the Escrow Stack
//!
//! Axum routes over the reconciliation engine. Handlers do three things:
//! extract the caller's identity from headers, translate JSON payloads
//! into engine calls, and shape engine results into response DTOs. All
//! sequencing and authorization decisions live in `esc-engine`.
//!
//! ## API Surface
//!
//! | Prefix                      | Module                  | Domain            |
//! |-----------------------------|-------------------------|-------------------|
//! | `/v1/projects/*`            | [`routes::projects`]    | Project lifecycle |
//! | `/v1/projects/*/milestones` | [`routes::milestones`]  | Submissions, reviews |
//! | `/v1/projects/*/disputes`   | [`routes::disputes`]    | Dispute filing    |
//! | `/v1/admin/*`               | [`routes::admin`]       | Admin overrides   |
//!
//! ## OpenAPI
//!
//! Auto-generated spec via utoipa derive macros at `/openapi.json`.

pub mod auth;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use crate::error::AppError;
pub use crate::state::AppState;

/// Assemble the full application router.
///
/// Identity extraction happens per-handler via [`auth::CallerIdentity`],
/// so `/health` and `/openapi.json` stay open without special casing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use esc_engine::Engine;
    use esc_ledger::StubLedger;
    use esc_mirror::MemoryStore;

    use super::*;

    const CLIENT: &str = "wallet-client-1";
    const FREELANCER: &str = "wallet-freelancer-1";
    const ADMIN_TOKEN: &str = "test-admin-token";

    fn make_app() -> Router {
        let engine = Engine::new(Arc::new(MemoryStore::new()), Arc::new(StubLedger::new()));
        app(AppState::new(
            Arc::new(engine),
            Some(ADMIN_TOKEN.to_string()),
        ))
    }

    fn post(uri: &str, wallet: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-wallet-address", wallet)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str, wallet: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-wallet-address", wallet)
            .body(Body::empty())
            .unwrap()
    }

    fn admin_get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
            .header("x-admin-id", Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create_request() -> Value {
        json!({
            "freelancer": FREELANCER,
            "title": "Brand redesign",
            "description": "Logo, palette, site",
            "category": "design",
            "token": "NATIVE",
            "milestones": [
                { "title": "Concepts", "amount": "25" },
                { "title": "Logo", "amount": "25" },
                { "title": "Palette", "amount": "25" },
                { "title": "Handoff", "amount": "25" }
            ]
        })
    }

    /// Create and fund a project, returning its id.
    async fn funded_project(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(post("/v1/projects", CLIENT, create_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let id = body["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(post(&format!("/v1/projects/{id}/fund"), CLIENT, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        id
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let app = make_app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_openapi_json_served() {
        let app = make_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["info"]["title"], "Escrow Stack API");
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = make_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/projects")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_wrong_admin_token_rejected() {
        let app = make_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/admin/stats")
                    .header("authorization", "Bearer wrong")
                    .header("x-admin-id", Uuid::new_v4().to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_project_and_read_back() {
        let app = make_app();
        let response = app
            .clone()
            .oneshot(post("/v1/projects", CLIENT, create_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "OPEN");
        assert_eq!(body["client"], CLIENT);
        assert_eq!(body["milestones"].as_array().unwrap().len(), 4);
        assert_eq!(body["milestones"][0]["status"], "LOCKED");
        assert_eq!(body["total_budget_micro"], 100_000_000u64);

        let id = body["id"].as_str().unwrap();
        let response = app
            .oneshot(get(&format!("/v1/projects/{id}"), FREELANCER))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_rejects_wrong_milestone_count() {
        let app = make_app();
        let mut req = create_request();
        req["milestones"].as_array_mut().unwrap().pop();
        let response = app.oneshot(post("/v1/projects", CLIENT, req)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_stranger_cannot_read_project() {
        let app = make_app();
        let id = funded_project(&app).await;
        let response = app
            .oneshot(get(&format!("/v1/projects/{id}"), "wallet-stranger"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_submit_and_approve_over_http() {
        let app = make_app();
        let id = funded_project(&app).await;

        let response = app
            .clone()
            .oneshot(post(
                &format!("/v1/projects/{id}/milestones/1/submit"),
                FREELANCER,
                json!({ "deliverable_url": "ipfs://concepts", "note": "first pass" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "SUBMITTED");
        assert!(body["completion_tx_id"].is_string());

        let response = app
            .clone()
            .oneshot(post(
                &format!("/v1/projects/{id}/milestones/1/review"),
                CLIENT,
                json!({ "decision": "approve" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "APPROVED");

        let response = app
            .oneshot(get(&format!("/v1/projects/{id}"), CLIENT))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["milestones"][0]["status"], "APPROVED");
        assert_eq!(body["milestones"][1]["status"], "PENDING");
    }

    #[tokio::test]
    async fn test_client_cannot_submit_milestone() {
        let app = make_app();
        let id = funded_project(&app).await;
        let response = app
            .oneshot(post(
                &format!("/v1/projects/{id}/milestones/1/submit"),
                CLIENT,
                json!({ "deliverable_url": "ipfs://x" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_review_before_submission_conflicts() {
        let app = make_app();
        let id = funded_project(&app).await;
        let response = app
            .oneshot(post(
                &format!("/v1/projects/{id}/milestones/2/review"),
                CLIENT,
                json!({ "decision": "approve" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_dispute_freezes_milestone() {
        let app = make_app();
        let id = funded_project(&app).await;
        let response = app
            .clone()
            .oneshot(post(
                &format!("/v1/projects/{id}/milestones/1/dispute"),
                CLIENT,
                json!({ "reason": "scope drift", "evidence_url": "https://ex/1" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "OPEN");

        // Second open dispute on the same milestone conflicts.
        let response = app
            .clone()
            .oneshot(post(
                &format!("/v1/projects/{id}/milestones/1/dispute"),
                FREELANCER,
                json!({ "reason": "counter-claim" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(get(&format!("/v1/projects/{id}"), CLIENT))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["milestones"][0]["status"], "DISPUTED");
        assert_eq!(body["open_disputes"], 1);
    }

    #[tokio::test]
    async fn test_admin_resolves_dispute_with_release() {
        let app = make_app();
        let id = funded_project(&app).await;
        app.clone()
            .oneshot(post(
                &format!("/v1/projects/{id}/milestones/1/dispute"),
                FREELANCER,
                json!({ "reason": "client unresponsive" }),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/v1/admin/projects/{id}/milestones/1/resolve"))
                    .header("content-type", "application/json")
                    .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
                    .header("x-admin-id", Uuid::new_v4().to_string())
                    .body(Body::from(
                        json!({ "resolution": "work verified", "settlement": "release" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "RESOLVED");

        let response = app
            .oneshot(get(&format!("/v1/projects/{id}"), CLIENT))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["milestones"][0]["status"], "APPROVED");
    }

    #[tokio::test]
    async fn test_admin_routes_forbidden_for_wallets() {
        let app = make_app();
        let response = app
            .oneshot(get("/v1/admin/stats", CLIENT))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_stats() {
        let app = make_app();
        funded_project(&app).await;
        let response = app.oneshot(admin_get("/v1/admin/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_projects"], 1);
        assert_eq!(body["active"], 1);
    }

    #[tokio::test]
    async fn test_unknown_project_is_404() {
        let app = make_app();
        let response = app
            .oneshot(get(&format!("/v1/projects/{}", Uuid::new_v4()), CLIENT))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
