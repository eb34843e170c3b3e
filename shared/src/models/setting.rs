//! Store Setting Model

use serde::{Deserialize, Serialize};

/// Flat key-value configuration entry; `key` is unique
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSetting {
    pub key: String,
    pub value: String,
}
