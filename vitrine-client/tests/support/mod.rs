//! In-memory REST fixture server for integration tests.
//!
//! Implements just enough of the catalog API to exercise the client:
//! products CRUD plus the code-keyed upsert, settings, and order creation
//! with idempotency-key dedup. A `stall` switch makes the product listing
//! hang so timeout behavior can be observed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post, put};
use chrono::Utc;

use shared::models::{
    NewOrder, Order, OrderItem, OrderStatus, OrderUpdate, PLACEHOLDER_IMAGE, Product,
    ProductCreate, ProductUpdate, ProductUpsertRow, StoreSetting,
};
use vitrine_client::IDEMPOTENCY_KEY_HEADER;

#[derive(Default)]
pub struct FixtureState {
    db: Mutex<Db>,
    /// Requests seen on `GET /products`
    pub product_list_hits: AtomicU32,
    /// Requests seen on `POST /orders`
    pub order_post_hits: AtomicU32,
    /// When set, `GET /products` hangs long enough to trip any sane deadline
    pub stall_product_list: AtomicBool,
}

#[derive(Default)]
struct Db {
    products: Vec<Product>,
    next_product_id: i64,
    settings: HashMap<String, String>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    next_order_id: i64,
    idempotency: HashMap<String, i64>,
}

impl FixtureState {
    pub fn order_count(&self) -> usize {
        self.db.lock().unwrap().orders.len()
    }

    pub fn product_image(&self, code: &str) -> Option<String> {
        self.db
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p.code == code)
            .map(|p| p.image_url.clone())
    }
}

fn materialize(id: i64, create: ProductCreate) -> Product {
    Product {
        id,
        name: create.name,
        code: create.code,
        slug: create.slug,
        price: create.price,
        original_price: create.original_price,
        description: create.description,
        image_url: create.image_url.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        category_id: create.category_id,
        active: create.active.unwrap_or(true),
        featured: create.featured.unwrap_or(false),
        featured_order: create.featured_order,
        brand: create.brand,
        quantity: create.quantity,
        unit_of_measure: create.unit_of_measure,
        reference: create.reference,
        manufacturer_code: create.manufacturer_code,
        quick_filter_1: create.quick_filter_1,
        quick_filter_2: create.quick_filter_2,
    }
}

async fn list_products(State(state): State<Arc<FixtureState>>) -> Json<Vec<Product>> {
    state.product_list_hits.fetch_add(1, Ordering::SeqCst);
    if state.stall_product_list.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
    Json(state.db.lock().unwrap().products.clone())
}

async fn product_by_slug(
    State(state): State<Arc<FixtureState>>,
    Path(slug): Path<String>,
) -> Result<Json<Product>, StatusCode> {
    state
        .db
        .lock()
        .unwrap()
        .products
        .iter()
        .find(|p| p.slug == slug && p.active)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn product_by_code(
    State(state): State<Arc<FixtureState>>,
    Path(code): Path<String>,
) -> Result<Json<Product>, StatusCode> {
    state
        .db
        .lock()
        .unwrap()
        .products
        .iter()
        .find(|p| p.code == code)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_product(
    State(state): State<Arc<FixtureState>>,
    Json(create): Json<ProductCreate>,
) -> Json<Product> {
    let mut db = state.db.lock().unwrap();
    db.next_product_id += 1;
    let product = materialize(db.next_product_id, create);
    db.products.push(product.clone());
    Json(product)
}

async fn update_product(
    State(state): State<Arc<FixtureState>>,
    Path(id): Path<i64>,
    Json(changes): Json<ProductUpdate>,
) -> StatusCode {
    let mut db = state.db.lock().unwrap();
    let Some(product) = db.products.iter_mut().find(|p| p.id == id) else {
        return StatusCode::NOT_FOUND;
    };
    if let Some(name) = changes.name {
        product.name = name;
    }
    if let Some(price) = changes.price {
        product.price = price;
    }
    if let Some(image_url) = changes.image_url {
        product.image_url = image_url;
    }
    if let Some(active) = changes.active {
        product.active = active;
    }
    StatusCode::NO_CONTENT
}

async fn delete_product(State(state): State<Arc<FixtureState>>, Path(id): Path<i64>) -> StatusCode {
    let mut db = state.db.lock().unwrap();
    let before = db.products.len();
    db.products.retain(|p| p.id != id);
    if db.products.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

/// Code-keyed upsert. The conflict rule: a placeholder image in the
/// incoming row never overwrites a stored real image.
async fn upsert_products(
    State(state): State<Arc<FixtureState>>,
    Json(rows): Json<Vec<ProductUpsertRow>>,
) -> StatusCode {
    let mut db = state.db.lock().unwrap();
    for row in rows {
        if let Some(existing) = db.products.iter_mut().find(|p| p.code == row.code) {
            if !row.has_placeholder_image() {
                existing.image_url = row.image_url.clone();
            }
            existing.name = row.name;
            existing.slug = row.slug;
            existing.price = row.price;
            existing.active = row.active;
        } else {
            db.next_product_id += 1;
            let id = db.next_product_id;
            db.products.push(Product {
                id,
                name: row.name,
                code: row.code,
                slug: row.slug,
                price: row.price,
                original_price: row.original_price,
                description: row.description,
                image_url: row.image_url,
                category_id: row.category_id,
                active: row.active,
                featured: false,
                featured_order: None,
                brand: row.brand,
                quantity: row.quantity,
                unit_of_measure: row.unit_of_measure,
                reference: row.reference,
                manufacturer_code: row.manufacturer_code,
                quick_filter_1: row.quick_filter_1,
                quick_filter_2: row.quick_filter_2,
            });
        }
    }
    StatusCode::NO_CONTENT
}

async fn list_settings(State(state): State<Arc<FixtureState>>) -> Json<Vec<StoreSetting>> {
    let db = state.db.lock().unwrap();
    Json(
        db.settings
            .iter()
            .map(|(key, value)| StoreSetting {
                key: key.clone(),
                value: value.clone(),
            })
            .collect(),
    )
}

#[derive(serde::Deserialize)]
struct SettingValue {
    value: String,
}

async fn update_setting(
    State(state): State<Arc<FixtureState>>,
    Path(key): Path<String>,
    Json(body): Json<SettingValue>,
) -> StatusCode {
    state.db.lock().unwrap().settings.insert(key, body.value);
    StatusCode::NO_CONTENT
}

async fn list_orders(State(state): State<Arc<FixtureState>>) -> Json<Vec<Order>> {
    Json(state.db.lock().unwrap().orders.clone())
}

async fn order_items(
    State(state): State<Arc<FixtureState>>,
    Path(order_id): Path<i64>,
) -> Json<Vec<OrderItem>> {
    let db = state.db.lock().unwrap();
    Json(
        db.order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect(),
    )
}

async fn create_order(
    State(state): State<Arc<FixtureState>>,
    headers: HeaderMap,
    Json(new_order): Json<NewOrder>,
) -> Json<Order> {
    state.order_post_hits.fetch_add(1, Ordering::SeqCst);
    let mut db = state.db.lock().unwrap();

    let key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Some(key) = &key {
        if let Some(existing_id) = db.idempotency.get(key).copied() {
            if let Some(existing) = db.orders.iter().find(|o| o.id == existing_id) {
                return Json(existing.clone());
            }
        }
    }

    db.next_order_id += 1;
    let id = db.next_order_id;
    let order = Order {
        id,
        customer_name: new_order.customer_name,
        customer_phone: new_order.customer_phone,
        customer_address: new_order.customer_address,
        customer_note: new_order.customer_note,
        subtotal: new_order.subtotal,
        shipping_fee: new_order.shipping_fee,
        total: new_order.total,
        status: OrderStatus::Pending,
        seller_id: new_order.seller_id,
        seller_name: new_order.seller_name,
        created_at: Utc::now(),
    };
    for (offset, item) in new_order.items.into_iter().enumerate() {
        db.order_items.push(OrderItem {
            id: id * 1_000 + offset as i64,
            order_id: id,
            product_id: item.product_id,
            product_name: item.product_name,
            product_code: item.product_code,
            unit_price: item.unit_price,
            quantity: item.quantity,
            total_price: item.total_price,
        });
    }
    db.orders.push(order.clone());
    if let Some(key) = key {
        db.idempotency.insert(key, id);
    }
    Json(order)
}

async fn update_order(
    State(state): State<Arc<FixtureState>>,
    Path(id): Path<i64>,
    Json(changes): Json<OrderUpdate>,
) -> StatusCode {
    let mut db = state.db.lock().unwrap();
    let Some(order) = db.orders.iter_mut().find(|o| o.id == id) else {
        return StatusCode::NOT_FOUND;
    };
    if let Some(status) = changes.status {
        order.status = status;
    }
    StatusCode::NO_CONTENT
}

fn router(state: Arc<FixtureState>) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/slug/{slug}", get(product_by_slug))
        .route("/products/code/{code}", get(product_by_code))
        .route("/products/upsert", post(upsert_products))
        .route(
            "/products/{id}",
            put(update_product).delete(delete_product),
        )
        .route("/settings", get(list_settings))
        .route("/settings/{key}", put(update_setting))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", put(update_order))
        .route("/orders/{id}/items", get(order_items))
        .with_state(state)
}

/// Bind an ephemeral port, serve the fixture, return its base URL and state.
pub async fn spawn_fixture() -> (String, Arc<FixtureState>) {
    let state = Arc::new(FixtureState::default());
    let app = router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture listener");
    let addr = listener.local_addr().expect("fixture local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fixture");
    });
    (format!("http://{addr}"), state)
}
