//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec, served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the admin bearer-token security scheme to the spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "admin_bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Admin bearer token; pair with the x-admin-id header.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the escrow API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Escrow Stack API",
        version = "0.1.0",
        description = "Milestone escrow coordinator for fixed four-milestone freelance projects.\n\nProvides:\n- **Project lifecycle** — creation, escrow funding, derived status views\n- **Milestone flow** — freelancer submissions, client reviews, automatic fund release\n- **Disputes** — participant-filed freezes, admin resolution with settlement\n- **Admin overrides** — forced release/refund, whole-project refund, abandoned sweep, stats\n\nParticipants authenticate with the `x-wallet-address` header; admins with a bearer token plus `x-admin-id`.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        crate::routes::health,
        // ── Projects ─────────────────────────────────────────────────────
        crate::routes::projects::create_project,
        crate::routes::projects::list_projects,
        crate::routes::projects::get_project,
        crate::routes::projects::fund_project,
        // ── Milestones ───────────────────────────────────────────────────
        crate::routes::milestones::submit_milestone,
        crate::routes::milestones::review_submission,
        crate::routes::milestones::list_submissions,
        // ── Disputes ─────────────────────────────────────────────────────
        crate::routes::disputes::file_dispute,
        crate::routes::disputes::list_disputes,
        // ── Admin ────────────────────────────────────────────────────────
        crate::routes::admin::resolve_dispute,
        crate::routes::admin::reset_dispute,
        crate::routes::admin::force_release,
        crate::routes::admin::force_refund,
        crate::routes::admin::refund_project,
        crate::routes::admin::abandoned_projects,
        crate::routes::admin::stats,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::routes::dto::ProjectResponse,
            crate::routes::dto::MilestoneResponse,
            crate::routes::dto::SubmissionResponse,
            crate::routes::dto::DisputeResponse,
            crate::routes::dto::StatsResponse,
            crate::routes::projects::CreateProjectRequest,
            crate::routes::projects::MilestoneRequest,
            crate::routes::milestones::SubmitRequest,
            crate::routes::milestones::ReviewRequest,
            crate::routes::disputes::FileDisputeRequest,
            crate::routes::admin::ResolveRequest,
            crate::routes::admin::ResetRequest,
            crate::routes::admin::OverrideRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "system", description = "Health probes"),
        (name = "projects", description = "Project lifecycle — creation, escrow funding, derived status views"),
        (name = "milestones", description = "Milestone submissions and client reviews"),
        (name = "disputes", description = "Participant-filed milestone freezes"),
        (name = "admin", description = "Admin overrides — dispute resolution, forced settlement, refunds, stats"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates_successfully() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Escrow Stack API");
        assert_eq!(spec.info.version, "0.1.0");
    }
}
