//! Seller Model

use serde::{Deserialize, Serialize};

/// Seller entity
///
/// The slug doubles as a URL prefix so each seller gets their own catalog
/// entry point; the WhatsApp number receives the formatted checkout message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub whatsapp: String,
    pub active: bool,
}

/// Create seller payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerCreate {
    pub name: String,
    pub slug: String,
    pub whatsapp: String,
    pub active: Option<bool>,
}

/// Update seller payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SellerUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub whatsapp: Option<String>,
    pub active: Option<bool>,
}
