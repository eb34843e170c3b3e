//! Direct REST backend
//!
//! Implements every gateway trait against the thin CRUD HTTP server, going
//! through the transport core so each call gets the timeout+retry policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use shared::models::{
    Banner, BannerCreate, BannerUpdate, Category, CategoryCreate, CategoryUpdate, NewOrder, Order,
    OrderItem, OrderUpdate, PaymentCondition, PaymentConditionCreate, PaymentConditionUpdate,
    Product, ProductCreate, ProductUpdate, ProductUpsertRow, Seller, SellerCreate, SellerUpdate,
    StoreSetting,
};
use shared::{Credentials, Session};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, Created, Upload, WriteOutcome};
use crate::gateway::{
    AuthGateway, BannersGateway, CategoriesGateway, ChangeCallback, OrdersGateway,
    PaymentConditionsGateway, ProductsGateway, RealtimeGateway, SellersGateway, SettingsGateway,
    StorageGateway,
};
use crate::realtime::{Subscription, spawn_polling};
use crate::storage_util;
use crate::transport::{HttpTransport, RetryPolicy, with_retry};

/// Header carrying the caller-generated idempotency token
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// Transport + retry policy shared by all REST gateways
#[derive(Debug, Clone)]
pub(crate) struct RestContext {
    transport: HttpTransport,
    retry: RetryPolicy,
}

impl RestContext {
    pub(crate) fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            transport: HttpTransport::new(&config.api_url, config.timeout)?,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                retry_delay: config.retry_delay,
            },
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        with_retry(&self.retry, || self.transport.get::<T>(path)).await
    }

    /// GET that maps a 404 application error to `None`.
    async fn find<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Option<T>> {
        match self.get::<T>(path).await {
            Ok(value) => Ok(Some(value)),
            Err(ClientError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn post<T, B>(&self, path: &str, body: &B, headers: Option<HeaderMap>) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + Sync,
    {
        with_retry(&self.retry, || {
            self.transport.post::<T, B>(path, body, headers.clone())
        })
        .await
    }

    async fn post_empty<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<()> {
        with_retry(&self.retry, || {
            self.transport
                .send_empty(self.transport.request(Method::POST, path).json(body))
        })
        .await
    }

    async fn put_empty<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<()> {
        with_retry(&self.retry, || {
            self.transport
                .send_empty(self.transport.request(Method::PUT, path).json(body))
        })
        .await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        with_retry(&self.retry, || self.transport.delete(path)).await
    }
}

// ============================================================================
// Products
// ============================================================================

pub struct RestProducts {
    ctx: RestContext,
}

impl RestProducts {
    pub(crate) fn new(ctx: RestContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ProductsGateway for RestProducts {
    async fn fetch_all(&self) -> ClientResult<Vec<Product>> {
        self.ctx.get("/products").await
    }

    async fn find_by_slug(&self, slug: &str) -> ClientResult<Option<Product>> {
        self.ctx.find(&format!("/products/slug/{slug}")).await
    }

    async fn find_by_code(&self, code: &str) -> ClientResult<Option<Product>> {
        self.ctx.find(&format!("/products/code/{code}")).await
    }

    async fn insert(&self, product: &ProductCreate) -> Created<Product> {
        Created::from_result(self.ctx.post("/products", product, None).await)
    }

    async fn update(&self, id: i64, changes: &ProductUpdate) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.put_empty(&format!("/products/{id}"), changes).await)
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.delete(&format!("/products/{id}")).await)
    }

    async fn upsert(&self, rows: &[ProductUpsertRow]) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.post_empty("/products/upsert", &rows).await)
    }
}

// ============================================================================
// Categories
// ============================================================================

pub struct RestCategories {
    ctx: RestContext,
}

impl RestCategories {
    pub(crate) fn new(ctx: RestContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CategoriesGateway for RestCategories {
    async fn fetch_all(&self) -> ClientResult<Vec<Category>> {
        self.ctx.get("/categories").await
    }

    async fn insert(&self, category: &CategoryCreate) -> Created<Category> {
        Created::from_result(self.ctx.post("/categories", category, None).await)
    }

    async fn insert_batch(&self, categories: &[CategoryCreate]) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.post_empty("/categories/batch", &categories).await)
    }

    async fn update(&self, id: i64, changes: &CategoryUpdate) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .put_empty(&format!("/categories/{id}"), changes)
                .await,
        )
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.delete(&format!("/categories/{id}")).await)
    }
}

// ============================================================================
// Settings
// ============================================================================

pub struct RestSettings {
    ctx: RestContext,
}

impl RestSettings {
    pub(crate) fn new(ctx: RestContext) -> Self {
        Self { ctx }
    }
}

#[derive(serde::Serialize)]
struct SettingValue<'a> {
    value: &'a str,
}

#[async_trait]
impl SettingsGateway for RestSettings {
    async fn fetch_all(&self) -> ClientResult<Vec<StoreSetting>> {
        self.ctx.get("/settings").await
    }

    async fn update(&self, key: &str, value: &str) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .put_empty(&format!("/settings/{key}"), &SettingValue { value })
                .await,
        )
    }
}

// ============================================================================
// Banners
// ============================================================================

pub struct RestBanners {
    ctx: RestContext,
}

impl RestBanners {
    pub(crate) fn new(ctx: RestContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BannersGateway for RestBanners {
    async fn fetch_all(&self) -> ClientResult<Vec<Banner>> {
        self.ctx.get("/banners").await
    }

    async fn insert(&self, banner: &BannerCreate) -> Created<Banner> {
        Created::from_result(self.ctx.post("/banners", banner, None).await)
    }

    async fn update(&self, id: i64, changes: &BannerUpdate) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.put_empty(&format!("/banners/{id}"), changes).await)
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.delete(&format!("/banners/{id}")).await)
    }
}

// ============================================================================
// Payment conditions
// ============================================================================

pub struct RestPaymentConditions {
    ctx: RestContext,
}

impl RestPaymentConditions {
    pub(crate) fn new(ctx: RestContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl PaymentConditionsGateway for RestPaymentConditions {
    async fn fetch_all(&self) -> ClientResult<Vec<PaymentCondition>> {
        self.ctx.get("/payment-conditions").await
    }

    async fn insert(&self, condition: &PaymentConditionCreate) -> Created<PaymentCondition> {
        Created::from_result(self.ctx.post("/payment-conditions", condition, None).await)
    }

    async fn update(&self, id: i64, changes: &PaymentConditionUpdate) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .put_empty(&format!("/payment-conditions/{id}"), changes)
                .await,
        )
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.delete(&format!("/payment-conditions/{id}")).await)
    }
}

// ============================================================================
// Sellers
// ============================================================================

pub struct RestSellers {
    ctx: RestContext,
}

impl RestSellers {
    pub(crate) fn new(ctx: RestContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SellersGateway for RestSellers {
    async fn fetch_all(&self) -> ClientResult<Vec<Seller>> {
        self.ctx.get("/sellers").await
    }

    async fn insert(&self, seller: &SellerCreate) -> Created<Seller> {
        Created::from_result(self.ctx.post("/sellers", seller, None).await)
    }

    async fn update(&self, id: i64, changes: &SellerUpdate) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.put_empty(&format!("/sellers/{id}"), changes).await)
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.delete(&format!("/sellers/{id}")).await)
    }
}

// ============================================================================
// Orders
// ============================================================================

pub struct RestOrders {
    ctx: RestContext,
}

impl RestOrders {
    pub(crate) fn new(ctx: RestContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl OrdersGateway for RestOrders {
    async fn fetch_all(&self) -> ClientResult<Vec<Order>> {
        self.ctx.get("/orders").await
    }

    async fn fetch_items(&self, order_id: i64) -> ClientResult<Vec<OrderItem>> {
        self.ctx.get(&format!("/orders/{order_id}/items")).await
    }

    async fn create(&self, order: &NewOrder, idempotency_key: Option<&str>) -> Created<Order> {
        // The header is attached identically on every retry so the server
        // can collapse a re-sent POST whose first response was lost.
        let headers = idempotency_key.and_then(|key| {
            let value = HeaderValue::from_str(key).ok()?;
            let mut headers = HeaderMap::new();
            headers.insert(IDEMPOTENCY_KEY_HEADER, value);
            Some(headers)
        });
        Created::from_result(self.ctx.post("/orders", order, headers).await)
    }

    async fn update(&self, id: i64, changes: &OrderUpdate) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.put_empty(&format!("/orders/{id}"), changes).await)
    }
}

// ============================================================================
// Storage
// ============================================================================

pub struct RestStorage {
    ctx: RestContext,
}

impl RestStorage {
    pub(crate) fn new(ctx: RestContext) -> Self {
        Self { ctx }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(serde::Serialize)]
struct Base64Upload<'a> {
    data: &'a str,
    file_name: &'a str,
}

#[async_trait]
impl StorageGateway for RestStorage {
    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Upload {
        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| storage_util::content_type_for(file_name));
        let file_name = file_name.to_string();

        let result = with_retry(&self.ctx.retry, || {
            // multipart forms are single-use; rebuild one per attempt
            let part = reqwest::multipart::Part::bytes(bytes.clone())
                .file_name(file_name.clone())
                .mime_str(&content_type)
                .unwrap_or_else(|_| {
                    reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone())
                });
            let form = reqwest::multipart::Form::new().part("file", part);
            let request = self
                .ctx
                .transport
                .request(Method::POST, "/upload/image")
                .multipart(form);
            self.ctx.transport.send::<UploadResponse>(request)
        })
        .await
        .map(|r| r.url);

        Upload::from_result(result)
    }

    async fn upload_base64(&self, data: &str, name_hint: Option<&str>) -> Upload {
        // Decode locally first: a malformed payload must fail before any
        // network call, and the extension comes from the content signature.
        let decoded = match storage_util::decode_base64_payload(data) {
            Ok(decoded) => decoded,
            Err(e) => {
                return Upload {
                    url: None,
                    error: Some(e.into()),
                };
            }
        };
        let (bytes, _mime) = decoded;
        let extension = name_hint
            .and_then(storage_util::extension_of)
            .or_else(|| storage_util::sniff_extension(&bytes))
            .unwrap_or("bin");
        let file_name = storage_util::unique_object_name(name_hint, extension);

        let payload = Base64Upload {
            data,
            file_name: &file_name,
        };
        let result = self
            .ctx
            .post::<UploadResponse, _>("/upload/base64", &payload, None)
            .await
            .map(|r| r.url);
        Upload::from_result(result)
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Direct-REST deployments are single-tenant and trusted: there is no real
/// multi-user auth, so the façade hands out a fixed synthetic admin
/// identity without touching the network.
pub struct RestAuth;

#[async_trait]
impl AuthGateway for RestAuth {
    async fn session(&self) -> ClientResult<Option<Session>> {
        Ok(Some(Session::synthetic_admin()))
    }

    async fn login(&self, _credentials: &Credentials) -> ClientResult<Session> {
        Ok(Session::synthetic_admin())
    }

    async fn logout(&self) -> WriteOutcome {
        WriteOutcome::ok()
    }

    async fn is_admin(&self) -> ClientResult<bool> {
        Ok(true)
    }
}

// ============================================================================
// Realtime (polling fallback)
// ============================================================================

/// No push mechanism exists behind the REST API, so subscriptions poll the
/// callback at a fixed cadence.
pub struct RestRealtime {
    poll_interval: Duration,
}

impl RestRealtime {
    pub(crate) fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

#[async_trait]
impl RealtimeGateway for RestRealtime {
    async fn subscribe_to_table(
        &self,
        table: &str,
        callback: ChangeCallback,
    ) -> ClientResult<Subscription> {
        Ok(spawn_polling(table, self.poll_interval, callback))
    }
}
