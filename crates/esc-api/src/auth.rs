//! # Caller Identity Extraction
//!
//! Wallet signature verification happens wallet-side, upstream of this
//! service; requests arrive with the caller's identity in headers:
//!
//! - `x-wallet-address` — a wallet participant (client or freelancer;
//!   which one is decided per-project by the engine).
//! - `Authorization: Bearer <token>` + `x-admin-id` — the admin
//!   capability. The token is compared against the configured value.
//!
//! Admin credentials win when both are present; a wrong admin token is
//! rejected outright rather than downgraded to a wallet caller.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use esc_core::{AdminId, Caller, WalletAddress};

use crate::error::AppError;
use crate::state::AppState;

const WALLET_HEADER: &str = "x-wallet-address";
const ADMIN_ID_HEADER: &str = "x-admin-id";

/// The authenticated caller, extracted from request headers.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Caller);

impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(bearer) = bearer_token(parts) {
            let expected = state.admin_token.as_deref().ok_or_else(|| {
                AppError::Unauthorized("admin access is not configured".to_string())
            })?;
            if bearer != expected {
                return Err(AppError::Unauthorized("invalid admin token".to_string()));
            }
            let raw = header(parts, ADMIN_ID_HEADER).ok_or_else(|| {
                AppError::Unauthorized(format!("missing {ADMIN_ID_HEADER} header"))
            })?;
            let id = Uuid::parse_str(raw)
                .map_err(|e| AppError::Unauthorized(format!("invalid admin id: {e}")))?;
            return Ok(CallerIdentity(Caller::Admin(AdminId(id))));
        }

        let raw = header(parts, WALLET_HEADER).ok_or_else(|| {
            AppError::Unauthorized(format!(
                "missing {WALLET_HEADER} header or admin credentials"
            ))
        })?;
        let address = WalletAddress::new(raw)
            .map_err(|e| AppError::Unauthorized(format!("invalid wallet address: {e}")))?;
        Ok(CallerIdentity(Caller::Wallet(address)))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    header(parts, "authorization")?.strip_prefix("Bearer ")
}
