//! Hosted backend-as-a-service
//!
//! Speaks the hosted row-API dialect: filters and ordering travel as query
//! parameters, writes steer behavior through `Prefer` headers, storage is
//! an object store with public URLs, and auth is a token endpoint. The same
//! transport core (timeout + retry) sits underneath; only the call shapes
//! differ from the REST backend.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::{OnceCell, RwLock};
use tokio_util::sync::CancellationToken;

use shared::models::{
    Banner, BannerCreate, BannerUpdate, Category, CategoryCreate, CategoryUpdate, NewOrder,
    NewOrderItem, Order, OrderItem, OrderUpdate, PaymentCondition, PaymentConditionCreate,
    PaymentConditionUpdate, Product, ProductCreate, ProductUpdate, ProductUpsertRow, Seller,
    SellerCreate, SellerUpdate, StoreSetting,
};
use shared::{Credentials, Session, UserInfo};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, Created, Upload, WriteOutcome};
use crate::gateway::rest::IDEMPOTENCY_KEY_HEADER;
use crate::gateway::{
    AuthGateway, BannersGateway, CategoriesGateway, ChangeCallback, OrdersGateway,
    PaymentConditionsGateway, ProductsGateway, RealtimeGateway, SellersGateway, SettingsGateway,
    StorageGateway,
};
use crate::push::PushChannel;
use crate::realtime::Subscription;
use crate::storage_util;
use crate::transport::{HttpTransport, RetryPolicy, with_retry};

/// Bucket holding catalog images
const STORAGE_BUCKET: &str = "images";

/// Transport + retry policy shared by all hosted gateways; the API key is
/// attached to every request as default headers.
#[derive(Debug, Clone)]
pub(crate) struct HostedContext {
    transport: HttpTransport,
    retry: RetryPolicy,
}

impl HostedContext {
    pub(crate) fn new(config: &ClientConfig) -> ClientResult<Self> {
        let url = config
            .hosted_url
            .as_deref()
            .ok_or_else(|| ClientError::Config("hosted_url is required in hosted mode".into()))?;
        let key = config
            .hosted_key
            .as_deref()
            .ok_or_else(|| ClientError::Config("hosted_key is required in hosted mode".into()))?;

        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(key)
            .map_err(|_| ClientError::Config("hosted_key contains invalid characters".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| ClientError::Config("hosted_key contains invalid characters".into()))?;
        headers.insert("apikey", key_value);
        headers.insert(AUTHORIZATION, bearer);

        Ok(Self {
            transport: HttpTransport::with_default_headers(url, config.timeout, headers)?,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                retry_delay: config.retry_delay,
            },
        })
    }

    /// `GET /rest/v1/{table}?{query}`
    async fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> ClientResult<Vec<T>> {
        let path = format!("/rest/v1/{table}?{query}");
        with_retry(&self.retry, || self.transport.get::<Vec<T>>(&path)).await
    }

    /// Single-row variant of [`select`](Self::select)
    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> ClientResult<Option<T>> {
        let mut rows = self.select::<T>(table, &format!("{query}&limit=1")).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Insert returning the created row
    async fn insert_returning<T, B>(&self, table: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + Sync,
    {
        self.insert_returning_with(table, body, None).await
    }

    async fn insert_returning_with<T, B>(
        &self,
        table: &str,
        body: &B,
        extra: Option<HeaderMap>,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + Sync,
    {
        let path = format!("/rest/v1/{table}");
        let mut rows: Vec<T> = with_retry(&self.retry, || {
            let mut request = self
                .transport
                .request(Method::POST, &path)
                .header("Prefer", "return=representation")
                .json(body);
            if let Some(extra) = &extra {
                request = request.headers(extra.clone());
            }
            self.transport.send(request)
        })
        .await?;
        if rows.is_empty() {
            return Err(ClientError::InvalidResponse(
                "insert returned no representation".into(),
            ));
        }
        Ok(rows.swap_remove(0))
    }

    /// Fire-and-check write (`return=minimal`)
    async fn write<B: serde::Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        prefer: &str,
    ) -> ClientResult<()> {
        with_retry(&self.retry, || {
            self.transport.send_empty(
                self.transport
                    .request(method.clone(), path)
                    .header("Prefer", prefer)
                    .json(body),
            )
        })
        .await
    }

    async fn delete_where(&self, table: &str, filter: &str) -> ClientResult<()> {
        let path = format!("/rest/v1/{table}?{filter}");
        with_retry(&self.retry, || {
            self.transport
                .send_empty(self.transport.request(Method::DELETE, &path))
        })
        .await
    }
}

// ============================================================================
// Products
// ============================================================================

pub struct HostedProducts {
    ctx: HostedContext,
}

impl HostedProducts {
    pub(crate) fn new(ctx: HostedContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ProductsGateway for HostedProducts {
    async fn fetch_all(&self) -> ClientResult<Vec<Product>> {
        self.ctx.select("products", "select=*&order=name.asc").await
    }

    async fn find_by_slug(&self, slug: &str) -> ClientResult<Option<Product>> {
        self.ctx
            .select_one("products", &format!("select=*&slug=eq.{slug}&active=eq.true"))
            .await
    }

    async fn find_by_code(&self, code: &str) -> ClientResult<Option<Product>> {
        self.ctx
            .select_one("products", &format!("select=*&code=eq.{code}"))
            .await
    }

    async fn insert(&self, product: &ProductCreate) -> Created<Product> {
        Created::from_result(self.ctx.insert_returning("products", product).await)
    }

    async fn update(&self, id: i64, changes: &ProductUpdate) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .write(
                    Method::PATCH,
                    &format!("/rest/v1/products?id=eq.{id}"),
                    changes,
                    "return=minimal",
                )
                .await,
        )
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.delete_where("products", &format!("id=eq.{id}")).await)
    }

    async fn upsert(&self, rows: &[ProductUpsertRow]) -> WriteOutcome {
        // merge-duplicates keyed on `code`; the server-side conflict rule
        // keeps a real image over the placeholder sentinel
        WriteOutcome::from_result(
            self.ctx
                .write(
                    Method::POST,
                    "/rest/v1/products?on_conflict=code",
                    &rows,
                    "resolution=merge-duplicates,return=minimal",
                )
                .await,
        )
    }
}

// ============================================================================
// Categories
// ============================================================================

pub struct HostedCategories {
    ctx: HostedContext,
}

impl HostedCategories {
    pub(crate) fn new(ctx: HostedContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CategoriesGateway for HostedCategories {
    async fn fetch_all(&self) -> ClientResult<Vec<Category>> {
        self.ctx
            .select("categories", "select=*&order=name.asc")
            .await
    }

    async fn insert(&self, category: &CategoryCreate) -> Created<Category> {
        Created::from_result(self.ctx.insert_returning("categories", category).await)
    }

    async fn insert_batch(&self, categories: &[CategoryCreate]) -> WriteOutcome {
        // one batched request, not a loop of inserts
        WriteOutcome::from_result(
            self.ctx
                .write(
                    Method::POST,
                    "/rest/v1/categories",
                    &categories,
                    "return=minimal",
                )
                .await,
        )
    }

    async fn update(&self, id: i64, changes: &CategoryUpdate) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .write(
                    Method::PATCH,
                    &format!("/rest/v1/categories?id=eq.{id}"),
                    changes,
                    "return=minimal",
                )
                .await,
        )
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .delete_where("categories", &format!("id=eq.{id}"))
                .await,
        )
    }
}

// ============================================================================
// Settings
// ============================================================================

pub struct HostedSettings {
    ctx: HostedContext,
}

impl HostedSettings {
    pub(crate) fn new(ctx: HostedContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SettingsGateway for HostedSettings {
    async fn fetch_all(&self) -> ClientResult<Vec<StoreSetting>> {
        self.ctx.select("store_settings", "select=*").await
    }

    async fn update(&self, key: &str, value: &str) -> WriteOutcome {
        let row = StoreSetting {
            key: key.to_string(),
            value: value.to_string(),
        };
        // settings are upserted on their unique key
        WriteOutcome::from_result(
            self.ctx
                .write(
                    Method::POST,
                    "/rest/v1/store_settings?on_conflict=key",
                    &row,
                    "resolution=merge-duplicates,return=minimal",
                )
                .await,
        )
    }
}

// ============================================================================
// Banners
// ============================================================================

pub struct HostedBanners {
    ctx: HostedContext,
}

impl HostedBanners {
    pub(crate) fn new(ctx: HostedContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl BannersGateway for HostedBanners {
    async fn fetch_all(&self) -> ClientResult<Vec<Banner>> {
        self.ctx
            .select("banners", "select=*&order=sort_order.asc")
            .await
    }

    async fn insert(&self, banner: &BannerCreate) -> Created<Banner> {
        Created::from_result(self.ctx.insert_returning("banners", banner).await)
    }

    async fn update(&self, id: i64, changes: &BannerUpdate) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .write(
                    Method::PATCH,
                    &format!("/rest/v1/banners?id=eq.{id}"),
                    changes,
                    "return=minimal",
                )
                .await,
        )
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.delete_where("banners", &format!("id=eq.{id}")).await)
    }
}

// ============================================================================
// Payment conditions
// ============================================================================

pub struct HostedPaymentConditions {
    ctx: HostedContext,
}

impl HostedPaymentConditions {
    pub(crate) fn new(ctx: HostedContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl PaymentConditionsGateway for HostedPaymentConditions {
    async fn fetch_all(&self) -> ClientResult<Vec<PaymentCondition>> {
        self.ctx
            .select("payment_conditions", "select=*&order=sort_order.asc")
            .await
    }

    async fn insert(&self, condition: &PaymentConditionCreate) -> Created<PaymentCondition> {
        Created::from_result(self.ctx.insert_returning("payment_conditions", condition).await)
    }

    async fn update(&self, id: i64, changes: &PaymentConditionUpdate) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .write(
                    Method::PATCH,
                    &format!("/rest/v1/payment_conditions?id=eq.{id}"),
                    changes,
                    "return=minimal",
                )
                .await,
        )
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .delete_where("payment_conditions", &format!("id=eq.{id}"))
                .await,
        )
    }
}

// ============================================================================
// Sellers
// ============================================================================

pub struct HostedSellers {
    ctx: HostedContext,
}

impl HostedSellers {
    pub(crate) fn new(ctx: HostedContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SellersGateway for HostedSellers {
    async fn fetch_all(&self) -> ClientResult<Vec<Seller>> {
        self.ctx.select("sellers", "select=*&order=name.asc").await
    }

    async fn insert(&self, seller: &SellerCreate) -> Created<Seller> {
        Created::from_result(self.ctx.insert_returning("sellers", seller).await)
    }

    async fn update(&self, id: i64, changes: &SellerUpdate) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .write(
                    Method::PATCH,
                    &format!("/rest/v1/sellers?id=eq.{id}"),
                    changes,
                    "return=minimal",
                )
                .await,
        )
    }

    async fn remove(&self, id: i64) -> WriteOutcome {
        WriteOutcome::from_result(self.ctx.delete_where("sellers", &format!("id=eq.{id}")).await)
    }
}

// ============================================================================
// Orders
// ============================================================================

pub struct HostedOrders {
    ctx: HostedContext,
}

impl HostedOrders {
    pub(crate) fn new(ctx: HostedContext) -> Self {
        Self { ctx }
    }
}

#[derive(serde::Serialize)]
struct HostedOrderHeader<'a> {
    customer_name: &'a str,
    customer_phone: &'a str,
    customer_address: Option<&'a str>,
    customer_note: Option<&'a str>,
    subtotal: Decimal,
    shipping_fee: Decimal,
    total: Decimal,
    seller_id: Option<i64>,
    seller_name: Option<&'a str>,
}

#[derive(serde::Serialize)]
struct HostedOrderItemRow<'a> {
    order_id: i64,
    product_id: Option<i64>,
    product_name: &'a str,
    product_code: &'a str,
    unit_price: Decimal,
    quantity: i32,
    total_price: Decimal,
}

impl<'a> HostedOrderItemRow<'a> {
    fn from_item(order_id: i64, item: &'a NewOrderItem) -> Self {
        Self {
            order_id,
            product_id: item.product_id,
            product_name: &item.product_name,
            product_code: &item.product_code,
            unit_price: item.unit_price,
            quantity: item.quantity,
            total_price: item.total_price,
        }
    }
}

#[async_trait]
impl OrdersGateway for HostedOrders {
    async fn fetch_all(&self) -> ClientResult<Vec<Order>> {
        self.ctx
            .select("orders", "select=*&order=created_at.desc")
            .await
    }

    async fn fetch_items(&self, order_id: i64) -> ClientResult<Vec<OrderItem>> {
        self.ctx
            .select("order_items", &format!("select=*&order_id=eq.{order_id}"))
            .await
    }

    async fn create(&self, order: &NewOrder, idempotency_key: Option<&str>) -> Created<Order> {
        let header = HostedOrderHeader {
            customer_name: &order.customer_name,
            customer_phone: &order.customer_phone,
            customer_address: order.customer_address.as_deref(),
            customer_note: order.customer_note.as_deref(),
            subtotal: order.subtotal,
            shipping_fee: order.shipping_fee,
            total: order.total,
            seller_id: order.seller_id,
            seller_name: order.seller_name.as_deref(),
        };

        let extra = idempotency_key.and_then(|key| {
            let value = HeaderValue::from_str(key).ok()?;
            let mut headers = HeaderMap::new();
            headers.insert(IDEMPOTENCY_KEY_HEADER, value);
            Some(headers)
        });

        let created: ClientResult<Order> = async {
            let created: Order = self
                .ctx
                .insert_returning_with("orders", &header, extra)
                .await?;
            let items: Vec<HostedOrderItemRow<'_>> = order
                .items
                .iter()
                .map(|item| HostedOrderItemRow::from_item(created.id, item))
                .collect();
            self.ctx
                .write(Method::POST, "/rest/v1/order_items", &items, "return=minimal")
                .await?;
            Ok(created)
        }
        .await;

        Created::from_result(created)
    }

    async fn update(&self, id: i64, changes: &OrderUpdate) -> WriteOutcome {
        WriteOutcome::from_result(
            self.ctx
                .write(
                    Method::PATCH,
                    &format!("/rest/v1/orders?id=eq.{id}"),
                    changes,
                    "return=minimal",
                )
                .await,
        )
    }
}

// ============================================================================
// Storage
// ============================================================================

pub struct HostedStorage {
    ctx: HostedContext,
}

impl HostedStorage {
    pub(crate) fn new(ctx: HostedContext) -> Self {
        Self { ctx }
    }

    fn public_url(&self, object: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{STORAGE_BUCKET}/{object}",
            self.ctx.transport.base_url()
        )
    }

    async fn put_object(&self, object: &str, bytes: Vec<u8>, content_type: &str) -> ClientResult<String> {
        let path = format!("/storage/v1/object/{STORAGE_BUCKET}/{object}");
        let content_type = content_type.to_string();
        with_retry(&self.ctx.retry, || {
            self.ctx.transport.send_empty(
                self.ctx
                    .transport
                    .request(Method::POST, &path)
                    .header(reqwest::header::CONTENT_TYPE, content_type.clone())
                    .body(bytes.clone()),
            )
        })
        .await?;
        Ok(self.public_url(object))
    }
}

#[async_trait]
impl StorageGateway for HostedStorage {
    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Upload {
        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| storage_util::content_type_for(file_name));
        let extension = storage_util::extension_of(file_name)
            .or_else(|| storage_util::sniff_extension(&bytes))
            .unwrap_or("bin");
        let object = storage_util::unique_object_name(Some(file_name), extension);
        Upload::from_result(self.put_object(&object, bytes, &content_type).await)
    }

    async fn upload_base64(&self, data: &str, name_hint: Option<&str>) -> Upload {
        let (bytes, mime) = match storage_util::decode_base64_payload(data) {
            Ok(decoded) => decoded,
            Err(e) => {
                return Upload {
                    url: None,
                    error: Some(e.into()),
                };
            }
        };
        let extension = name_hint
            .and_then(storage_util::extension_of)
            .or_else(|| storage_util::sniff_extension(&bytes))
            .unwrap_or("bin");
        let object = storage_util::unique_object_name(name_hint, extension);
        let content_type =
            mime.unwrap_or_else(|| storage_util::content_type_for(&format!("x.{extension}")));
        Upload::from_result(self.put_object(&object, bytes, &content_type).await)
    }
}

// ============================================================================
// Auth
// ============================================================================

pub struct HostedAuth {
    ctx: HostedContext,
    session: RwLock<Option<Session>>,
}

impl HostedAuth {
    pub(crate) fn new(ctx: HostedContext) -> Self {
        Self {
            ctx,
            session: RwLock::new(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: HostedUser,
}

#[derive(Debug, Deserialize)]
struct HostedUser {
    id: String,
    email: String,
    #[serde(default)]
    role: Option<String>,
}

impl From<HostedUser> for UserInfo {
    fn from(user: HostedUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role.unwrap_or_else(|| "authenticated".to_string()),
        }
    }
}

#[async_trait]
impl AuthGateway for HostedAuth {
    async fn session(&self) -> ClientResult<Option<Session>> {
        let Some(session) = self.session.read().await.clone() else {
            return Ok(None);
        };

        // revalidate the cached token against the identity endpoint; a
        // rejected token means the session is gone, not a hard failure
        let token = session.access_token.clone();
        let user: ClientResult<HostedUser> = with_retry(&self.ctx.retry, || {
            self.ctx.transport.send(
                self.ctx
                    .transport
                    .request(Method::GET, "/auth/v1/user")
                    .header(AUTHORIZATION, format!("Bearer {token}")),
            )
        })
        .await;

        match user {
            Ok(user) => Ok(Some(Session {
                user: user.into(),
                access_token: session.access_token,
            })),
            Err(ClientError::Api { status: 401, .. }) => {
                *self.session.write().await = None;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn login(&self, credentials: &Credentials) -> ClientResult<Session> {
        let response: TokenResponse = with_retry(&self.ctx.retry, || {
            self.ctx.transport.send(
                self.ctx
                    .transport
                    .request(Method::POST, "/auth/v1/token?grant_type=password")
                    .json(credentials),
            )
        })
        .await?;

        let session = Session {
            user: response.user.into(),
            access_token: response.access_token,
        };
        *self.session.write().await = Some(session.clone());
        tracing::info!(user = %session.user.email, "logged in to hosted backend");
        Ok(session)
    }

    async fn logout(&self) -> WriteOutcome {
        let token = self
            .session
            .write()
            .await
            .take()
            .map(|session| session.access_token);
        let Some(token) = token else {
            return WriteOutcome::ok();
        };
        WriteOutcome::from_result(
            with_retry(&self.ctx.retry, || {
                self.ctx.transport.send_empty(
                    self.ctx
                        .transport
                        .request(Method::POST, "/auth/v1/logout")
                        .header(AUTHORIZATION, format!("Bearer {token}")),
                )
            })
            .await,
        )
    }

    async fn is_admin(&self) -> ClientResult<bool> {
        Ok(self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.user.is_admin())
            .unwrap_or(false))
    }
}

// ============================================================================
// Realtime (push channel)
// ============================================================================

pub struct HostedRealtime {
    push_addr: String,
    channel: OnceCell<PushChannel>,
}

impl HostedRealtime {
    pub(crate) fn new(config: &ClientConfig) -> ClientResult<Self> {
        let push_addr = config
            .push_addr
            .clone()
            .ok_or_else(|| ClientError::Config("push_addr is required in hosted mode".into()))?;
        Ok(Self {
            push_addr,
            channel: OnceCell::new(),
        })
    }

    async fn channel(&self) -> ClientResult<&PushChannel> {
        self.channel
            .get_or_try_init(|| PushChannel::connect(&self.push_addr))
            .await
    }
}

#[async_trait]
impl RealtimeGateway for HostedRealtime {
    async fn subscribe_to_table(
        &self,
        table: &str,
        callback: ChangeCallback,
    ) -> ClientResult<Subscription> {
        let mut rx = self.channel().await?.subscribe();
        let token = CancellationToken::new();
        let task_token = token.clone();
        let table = table.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(change) if change.table == table => callback(change),
                        Ok(_) => {}
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(table = %table, skipped, "push subscriber lagged");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                            tracing::debug!(table = %table, "push channel closed");
                            break;
                        }
                    },
                }
            }
        });

        Ok(Subscription::new(token))
    }
}
