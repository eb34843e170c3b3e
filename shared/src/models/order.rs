//! Order Model
//!
//! An order carries 1..N items. Each item is a denormalized snapshot of the
//! product name/code/price at order time — it is never re-derived from the
//! live product row, which may have changed or been deleted since.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub customer_note: Option<String>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub seller_id: Option<i64>,
    pub seller_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order line item (immutable snapshot)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub product_code: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
}

/// Order creation payload: header and line items travel together in one
/// request so the server can insert both inside a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub customer_note: Option<String>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub seller_id: Option<i64>,
    pub seller_name: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// Line item within a `NewOrder`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub product_code: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
}

/// Update order payload (status transitions from the back office)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
}

impl NewOrderItem {
    /// Snapshot a line item, computing the extended price.
    pub fn snapshot(
        product_id: Option<i64>,
        name: impl Into<String>,
        code: impl Into<String>,
        unit_price: Decimal,
        quantity: i32,
    ) -> Self {
        Self {
            product_id,
            product_name: name.into(),
            product_code: code.into(),
            unit_price,
            quantity,
            total_price: unit_price * Decimal::from(quantity),
        }
    }
}
