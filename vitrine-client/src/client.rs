//! Client composition root
//!
//! The backend mode is resolved exactly once, here: `VitrineClient::new`
//! builds the full gateway set for the configured backend and everything
//! downstream works against the trait objects.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::{BackendMode, ClientConfig};
use crate::error::ClientResult;
use crate::gateway::hosted::{
    HostedAuth, HostedBanners, HostedCategories, HostedContext, HostedOrders,
    HostedPaymentConditions, HostedProducts, HostedRealtime, HostedSellers, HostedSettings,
    HostedStorage,
};
use crate::gateway::rest::{
    RestAuth, RestBanners, RestCategories, RestContext, RestOrders, RestPaymentConditions,
    RestProducts, RestRealtime, RestSellers, RestSettings, RestStorage,
};
use crate::gateway::{
    AuthGateway, BannersGateway, CategoriesGateway, OrdersGateway, PaymentConditionsGateway,
    ProductsGateway, RealtimeGateway, SellersGateway, SettingsGateway, StorageGateway,
};

/// Data access client for the storefront and admin surfaces.
///
/// Construct once and share; all gateways are cheap `Arc` handles.
#[derive(Clone)]
pub struct VitrineClient {
    products: Arc<dyn ProductsGateway>,
    categories: Arc<dyn CategoriesGateway>,
    settings: Arc<dyn SettingsGateway>,
    banners: Arc<dyn BannersGateway>,
    payment_conditions: Arc<dyn PaymentConditionsGateway>,
    sellers: Arc<dyn SellersGateway>,
    orders: Arc<dyn OrdersGateway>,
    storage: Arc<dyn StorageGateway>,
    auth: Arc<dyn AuthGateway>,
    realtime: Arc<dyn RealtimeGateway>,
}

impl VitrineClient {
    /// Build the gateway set for the configured backend.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        match config.mode {
            BackendMode::Rest => Self::new_rest(&config),
            BackendMode::Hosted => Self::new_hosted(&config),
        }
    }

    fn new_rest(config: &ClientConfig) -> ClientResult<Self> {
        let ctx = RestContext::new(config)?;
        tracing::debug!(url = %config.api_url, "using direct REST backend");
        Ok(Self {
            products: Arc::new(RestProducts::new(ctx.clone())),
            categories: Arc::new(RestCategories::new(ctx.clone())),
            settings: Arc::new(RestSettings::new(ctx.clone())),
            banners: Arc::new(RestBanners::new(ctx.clone())),
            payment_conditions: Arc::new(RestPaymentConditions::new(ctx.clone())),
            sellers: Arc::new(RestSellers::new(ctx.clone())),
            orders: Arc::new(RestOrders::new(ctx.clone())),
            storage: Arc::new(RestStorage::new(ctx)),
            auth: Arc::new(RestAuth),
            realtime: Arc::new(RestRealtime::new(config.poll_interval)),
        })
    }

    fn new_hosted(config: &ClientConfig) -> ClientResult<Self> {
        let ctx = HostedContext::new(config)?;
        tracing::debug!("using hosted backend");
        Ok(Self {
            products: Arc::new(HostedProducts::new(ctx.clone())),
            categories: Arc::new(HostedCategories::new(ctx.clone())),
            settings: Arc::new(HostedSettings::new(ctx.clone())),
            banners: Arc::new(HostedBanners::new(ctx.clone())),
            payment_conditions: Arc::new(HostedPaymentConditions::new(ctx.clone())),
            sellers: Arc::new(HostedSellers::new(ctx.clone())),
            orders: Arc::new(HostedOrders::new(ctx.clone())),
            storage: Arc::new(HostedStorage::new(ctx.clone())),
            auth: Arc::new(HostedAuth::new(ctx)),
            realtime: Arc::new(HostedRealtime::new(config)?),
        })
    }

    pub fn products(&self) -> &dyn ProductsGateway {
        self.products.as_ref()
    }

    pub fn categories(&self) -> &dyn CategoriesGateway {
        self.categories.as_ref()
    }

    pub fn settings(&self) -> &dyn SettingsGateway {
        self.settings.as_ref()
    }

    pub fn banners(&self) -> &dyn BannersGateway {
        self.banners.as_ref()
    }

    pub fn payment_conditions(&self) -> &dyn PaymentConditionsGateway {
        self.payment_conditions.as_ref()
    }

    pub fn sellers(&self) -> &dyn SellersGateway {
        self.sellers.as_ref()
    }

    pub fn orders(&self) -> &dyn OrdersGateway {
        self.orders.as_ref()
    }

    pub fn storage(&self) -> &dyn StorageGateway {
        self.storage.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthGateway {
        self.auth.as_ref()
    }

    pub fn realtime(&self) -> &dyn RealtimeGateway {
        self.realtime.as_ref()
    }
}

/// Fresh idempotency key for order submission. Generate once per checkout
/// attempt and pass the same key through every retry of that attempt.
pub fn new_idempotency_key() -> String {
    Uuid::new_v4().to_string()
}
