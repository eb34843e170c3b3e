//! Resource gateway traits
//!
//! One capability trait per resource. Both backends implement the same
//! traits and the implementation set is chosen once, at the composition
//! root — callers never see the backend mode.
//!
//! Return shapes follow the caller contract: bare reads return the raw
//! value (or fail with `ClientError`), mutations return outcome wrappers
//! and never fail hard.

pub mod hosted;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;

use shared::models::{
    Banner, BannerCreate, BannerUpdate, Category, CategoryCreate, CategoryUpdate, NewOrder, Order,
    OrderItem, OrderUpdate, PaymentCondition, PaymentConditionCreate, PaymentConditionUpdate,
    Product, ProductCreate, ProductUpdate, ProductUpsertRow, Seller, SellerCreate, SellerUpdate,
    StoreSetting,
};
use shared::{Credentials, Session, TableChange};

use crate::error::{ClientResult, Created, Upload, WriteOutcome};
use crate::realtime::Subscription;

/// Callback invoked for every change on a subscribed table
pub type ChangeCallback = Arc<dyn Fn(TableChange) + Send + Sync>;

/// Products: catalog reads, CRUD, and the bulk-import upsert
#[async_trait]
pub trait ProductsGateway: Send + Sync {
    async fn fetch_all(&self) -> ClientResult<Vec<Product>>;
    /// `None` when no active product carries the slug
    async fn find_by_slug(&self, slug: &str) -> ClientResult<Option<Product>>;
    /// `None` when the code is unknown
    async fn find_by_code(&self, code: &str) -> ClientResult<Option<Product>>;
    async fn insert(&self, product: &ProductCreate) -> Created<Product>;
    async fn update(&self, id: i64, changes: &ProductUpdate) -> WriteOutcome;
    async fn remove(&self, id: i64) -> WriteOutcome;
    /// Bulk insert-or-update keyed on product `code`. Conflicting rows are
    /// updated in place; the placeholder image sentinel never overwrites a
    /// real stored image.
    async fn upsert(&self, rows: &[ProductUpsertRow]) -> WriteOutcome;
}

/// Categories, including the batch-insert path used by bulk import
#[async_trait]
pub trait CategoriesGateway: Send + Sync {
    async fn fetch_all(&self) -> ClientResult<Vec<Category>>;
    async fn insert(&self, category: &CategoryCreate) -> Created<Category>;
    async fn insert_batch(&self, categories: &[CategoryCreate]) -> WriteOutcome;
    async fn update(&self, id: i64, changes: &CategoryUpdate) -> WriteOutcome;
    async fn remove(&self, id: i64) -> WriteOutcome;
}

/// Flat key-value store settings
#[async_trait]
pub trait SettingsGateway: Send + Sync {
    async fn fetch_all(&self) -> ClientResult<Vec<StoreSetting>>;
    async fn update(&self, key: &str, value: &str) -> WriteOutcome;
}

/// Banners, ordered by sort_order
#[async_trait]
pub trait BannersGateway: Send + Sync {
    async fn fetch_all(&self) -> ClientResult<Vec<Banner>>;
    async fn insert(&self, banner: &BannerCreate) -> Created<Banner>;
    async fn update(&self, id: i64, changes: &BannerUpdate) -> WriteOutcome;
    async fn remove(&self, id: i64) -> WriteOutcome;
}

/// Payment conditions offered at checkout
#[async_trait]
pub trait PaymentConditionsGateway: Send + Sync {
    async fn fetch_all(&self) -> ClientResult<Vec<PaymentCondition>>;
    async fn insert(&self, condition: &PaymentConditionCreate) -> Created<PaymentCondition>;
    async fn update(&self, id: i64, changes: &PaymentConditionUpdate) -> WriteOutcome;
    async fn remove(&self, id: i64) -> WriteOutcome;
}

/// Sellers (slug doubles as catalog URL prefix)
#[async_trait]
pub trait SellersGateway: Send + Sync {
    async fn fetch_all(&self) -> ClientResult<Vec<Seller>>;
    async fn insert(&self, seller: &SellerCreate) -> Created<Seller>;
    async fn update(&self, id: i64, changes: &SellerUpdate) -> WriteOutcome;
    async fn remove(&self, id: i64) -> WriteOutcome;
}

/// Orders and their immutable line-item snapshots
#[async_trait]
pub trait OrdersGateway: Send + Sync {
    async fn fetch_all(&self) -> ClientResult<Vec<Order>>;
    async fn fetch_items(&self, order_id: i64) -> ClientResult<Vec<OrderItem>>;
    /// Create the order header and its items in one call. The optional
    /// idempotency key is attached as a request header and re-sent
    /// identically on retry so the server can collapse duplicates.
    async fn create(&self, order: &NewOrder, idempotency_key: Option<&str>) -> Created<Order>;
    async fn update(&self, id: i64, changes: &OrderUpdate) -> WriteOutcome;
}

/// File/object storage with publicly resolvable URLs
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Upload raw bytes. When `content_type` is absent the extension is
    /// inferred from the content signature.
    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Upload;
    /// Upload a base64 payload (bare or `data:` URL).
    async fn upload_base64(&self, data: &str, name_hint: Option<&str>) -> Upload;
}

/// Session/identity retrieval and admin-role checks
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn session(&self) -> ClientResult<Option<Session>>;
    async fn login(&self, credentials: &Credentials) -> ClientResult<Session>;
    async fn logout(&self) -> WriteOutcome;
    async fn is_admin(&self) -> ClientResult<bool>;
}

/// Table change subscriptions
#[async_trait]
pub trait RealtimeGateway: Send + Sync {
    /// Subscribe to changes on `table`. The returned handle must be kept
    /// alive for the subscription's lifetime; `unsubscribe()` (or dropping
    /// it) stops further callbacks.
    async fn subscribe_to_table(
        &self,
        table: &str,
        callback: ChangeCallback,
    ) -> ClientResult<Subscription>;
}
