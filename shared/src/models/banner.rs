//! Banner Model

use serde::{Deserialize, Serialize};

/// Banner entity, listed ordered by `sort_order`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Banner {
    pub id: i64,
    pub image_url: String,
    pub link: Option<String>,
    pub sort_order: i32,
    pub active: bool,
}

/// Create banner payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerCreate {
    pub image_url: String,
    pub link: Option<String>,
    pub sort_order: Option<i32>,
    pub active: Option<bool>,
}

/// Update banner payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BannerUpdate {
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub sort_order: Option<i32>,
    pub active: Option<bool>,
}
