//! Shared types for the Vitrine catalog
//!
//! Entity models and wire DTOs used by both the data-access client and
//! server implementations of the catalog REST API.

pub mod auth;
pub mod models;
pub mod realtime;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use auth::{Credentials, Session, UserInfo};
pub use realtime::{ChangeKind, TableChange};
