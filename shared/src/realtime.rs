//! Realtime change-feed types
//!
//! Shared between the push-channel client and any server that emits table
//! changes. Frames on the wire are a 1-byte change kind, a little-endian
//! u32 payload length, then a JSON-encoded [`TableChange`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Push channel protocol version, exchanged during the hello frame
pub const PUSH_PROTOCOL_VERSION: u16 = 1;

/// Kind of table change carried by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Row inserted
    Insert = 0,
    /// Row updated
    Update = 1,
    /// Row deleted
    Delete = 2,
    /// No row payload; subscriber should refetch (polling fallback)
    Refresh = 3,
}

impl TryFrom<u8> for ChangeKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChangeKind::Insert),
            1 => Ok(ChangeKind::Update),
            2 => Ok(ChangeKind::Delete),
            3 => Ok(ChangeKind::Refresh),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "insert"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
            ChangeKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// A single change on one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableChange {
    pub table: String,
    pub kind: ChangeKind,
    /// Affected row as sent by the backend; absent for `Refresh`
    pub row: Option<serde_json::Value>,
}

impl TableChange {
    pub fn new(table: impl Into<String>, kind: ChangeKind, row: Option<serde_json::Value>) -> Self {
        Self {
            table: table.into(),
            kind,
            row,
        }
    }

    /// Synthetic tick emitted by the polling fallback.
    pub fn refresh(table: impl Into<String>) -> Self {
        Self::new(table, ChangeKind::Refresh, None)
    }
}
