//! Auth DTOs shared between client and server
//!
//! The hosted backend issues real sessions; direct-REST deployments are
//! single-tenant and get a fixed synthetic admin identity instead.

use serde::{Deserialize, Serialize};

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: UserInfo,
    pub access_token: String,
}

/// User identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl UserInfo {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

impl Session {
    /// The fixed identity handed out in direct-REST mode.
    ///
    /// Callers must treat that mode as single-tenant/trusted: there is no
    /// per-user authorization behind this session.
    pub fn synthetic_admin() -> Self {
        Self {
            user: UserInfo {
                id: "local-admin".to_string(),
                email: "admin@local".to_string(),
                role: "admin".to_string(),
            },
            access_token: "local".to_string(),
        }
    }
}
