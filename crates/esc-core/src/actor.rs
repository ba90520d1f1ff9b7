//! # Actor Roles and Capabilities
//!
//! Three actor roles drive the escrow workflow: the client who funds, the
//! freelancer who delivers, and the administrator who resolves stuck or
//! adversarial cases. Session issuance and signature verification happen
//! upstream; this module only models the identity that arrives with a
//! request once authenticated.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::WalletAddress;

/// Administrator identity, distinct from wallet-holding participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminId(pub Uuid);

impl AdminId {
    /// Generate a new random admin identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AdminId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AdminId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "admin:{}", self.0)
    }
}

/// The role a caller authenticated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Funds the escrow and reviews deliverables.
    Client,
    /// Delivers work and submits milestones.
    Freelancer,
    /// Privileged overrides and dispute resolution.
    Admin,
}

impl Role {
    /// The canonical string name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Freelancer => "FREELANCER",
            Self::Admin => "ADMIN",
        }
    }

    /// Parse a canonical role name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CLIENT" => Some(Self::Client),
            "FREELANCER" => Some(Self::Freelancer),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity behind a request.
///
/// Wallet callers (client or freelancer) are authorized per-project by
/// comparing their address against the project row; which side of the
/// agreement they are on is a property of the project, not the session.
/// Admin callers carry a capability that bypasses the per-project check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caller {
    /// A wallet-holding participant (client or freelancer of some project).
    Wallet(WalletAddress),
    /// An administrator.
    Admin(AdminId),
}

impl Caller {
    /// Whether this caller holds the admin capability.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// The wallet address, if this is a wallet caller.
    pub fn wallet(&self) -> Option<&WalletAddress> {
        match self {
            Self::Wallet(addr) => Some(addr),
            Self::Admin(_) => None,
        }
    }

    /// The admin identity, if this is an admin caller.
    pub fn admin(&self) -> Option<AdminId> {
        match self {
            Self::Admin(id) => Some(*id),
            Self::Wallet(_) => None,
        }
    }
}

impl std::fmt::Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wallet(addr) => write!(f, "wallet:{addr}"),
            Self::Admin(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("client"), Some(Role::Client));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("auditor"), None);
    }

    #[test]
    fn test_caller_capabilities() {
        let wallet = Caller::Wallet(WalletAddress::new("ST1ABC").unwrap());
        let admin = Caller::Admin(AdminId::new());
        assert!(!wallet.is_admin());
        assert!(admin.is_admin());
        assert!(wallet.wallet().is_some());
        assert!(admin.admin().is_some());
    }
}
