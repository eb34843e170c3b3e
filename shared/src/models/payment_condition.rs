//! Payment Condition Model

use serde::{Deserialize, Serialize};

/// Payment condition offered at checkout, listed ordered by `sort_order`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCondition {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub sort_order: i32,
}

/// Create payment condition payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConditionCreate {
    pub name: String,
    pub active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Update payment condition payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentConditionUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub sort_order: Option<i32>,
}
