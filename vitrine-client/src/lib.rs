//! Data access client for the vitrine storefront.
//!
//! One [`VitrineClient`] fronts both supported backends — a direct REST API
//! over the relational store, or a hosted backend-as-a-service (row API,
//! object storage, token auth, push channel). The backend is picked once at
//! construction from [`ClientConfig`]; everything after that goes through
//! per-resource gateway traits, so callers never branch on the mode.
//!
//! Read operations return [`ClientResult`] and may fail hard. Mutations
//! return outcome wrappers ([`WriteOutcome`], [`Created`], [`Upload`]) whose
//! `error` slot is the whole failure contract.
//!
//! ```no_run
//! use vitrine_client::{ClientConfig, VitrineClient};
//!
//! # async fn demo() -> Result<(), vitrine_client::ClientError> {
//! let client = VitrineClient::new(ClientConfig::rest("http://localhost:8080"))?;
//! let products = client.products().fetch_all().await?;
//! println!("{} products", products.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod push;
pub mod realtime;
pub mod storage_util;
pub mod transport;

pub use client::{VitrineClient, new_idempotency_key};
pub use config::{BackendMode, ClientConfig};
pub use error::{ClientError, ClientResult, Created, ErrorDetail, Upload, WriteOutcome};
pub use gateway::{
    AuthGateway, BannersGateway, CategoriesGateway, ChangeCallback, OrdersGateway,
    PaymentConditionsGateway, ProductsGateway, RealtimeGateway, SellersGateway, SettingsGateway,
    StorageGateway, rest::IDEMPOTENCY_KEY_HEADER,
};
pub use realtime::Subscription;

pub use shared::models;
pub use shared::{ChangeKind, Credentials, Session, TableChange, UserInfo};
