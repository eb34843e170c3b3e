//! End-to-end tests for the direct REST backend against the in-memory
//! fixture server.

mod support;

use std::sync::atomic::Ordering;
use std::time::Duration;

use rust_decimal::Decimal;

use shared::models::{
    NewOrder, NewOrderItem, OrderStatus, OrderUpdate, PLACEHOLDER_IMAGE, ProductCreate,
    ProductUpdate, ProductUpsertRow,
};
use vitrine_client::{ClientConfig, ClientError, VitrineClient, new_idempotency_key};

use support::spawn_fixture;

fn sample_product(name: &str, code: &str) -> ProductCreate {
    ProductCreate {
        name: name.to_string(),
        code: code.to_string(),
        slug: shared::models::slugify(name),
        price: Decimal::new(990, 2),
        original_price: None,
        description: None,
        image_url: None,
        category_id: None,
        active: Some(true),
        featured: None,
        featured_order: None,
        brand: None,
        quantity: None,
        unit_of_measure: None,
        reference: None,
        manufacturer_code: None,
        quick_filter_1: None,
        quick_filter_2: None,
    }
}

fn sample_order() -> NewOrder {
    let item = NewOrderItem::snapshot(Some(1), "Cafe Torrado", "C-1", Decimal::new(1250, 2), 2);
    NewOrder {
        customer_name: "Ana".to_string(),
        customer_phone: "+5511999990000".to_string(),
        customer_address: Some("Rua A, 10".to_string()),
        customer_note: None,
        subtotal: item.total_price,
        shipping_fee: Decimal::ZERO,
        total: item.total_price,
        seller_id: None,
        seller_name: None,
        items: vec![item],
    }
}

#[tokio::test]
async fn product_crud_round_trip() {
    let (url, _state) = spawn_fixture().await;
    let client = VitrineClient::new(ClientConfig::rest(url)).unwrap();

    let created = client.products().insert(&sample_product("Cafe Torrado", "C-1")).await;
    assert!(created.is_ok(), "insert failed: {:?}", created.error);
    let product = created.data.unwrap();
    assert_eq!(product.slug, "cafe-torrado");

    let all = client.products().fetch_all().await.unwrap();
    assert_eq!(all.len(), 1);

    let found = client.products().find_by_slug("cafe-torrado").await.unwrap();
    assert_eq!(found.unwrap().code, "C-1");

    // unknown slug maps the 404 to None rather than an error
    let missing = client.products().find_by_slug("nope").await.unwrap();
    assert!(missing.is_none());

    let outcome = client
        .products()
        .update(
            product.id,
            &ProductUpdate {
                price: Some(Decimal::new(1090, 2)),
                ..ProductUpdate::default()
            },
        )
        .await;
    assert!(outcome.is_ok());
    let updated = client.products().find_by_code("C-1").await.unwrap().unwrap();
    assert_eq!(updated.price, Decimal::new(1090, 2));

    assert!(client.products().remove(product.id).await.is_ok());
    assert!(client.products().fetch_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_keeps_real_image_over_placeholder() {
    let (url, state) = spawn_fixture().await;
    let client = VitrineClient::new(ClientConfig::rest(url)).unwrap();

    let mut with_image = ProductUpsertRow::new("Feijao", "F-1", Decimal::new(850, 2));
    with_image.image_url = "https://cdn.example.com/feijao.jpg".to_string();
    assert!(client.products().upsert(&[with_image]).await.is_ok());

    // re-import without an image: the placeholder must not clobber the photo
    let refresh = ProductUpsertRow::new("Feijao Tipo 1", "F-1", Decimal::new(899, 2));
    assert!(refresh.has_placeholder_image());
    assert!(client.products().upsert(&[refresh]).await.is_ok());

    assert_eq!(
        state.product_image("F-1").as_deref(),
        Some("https://cdn.example.com/feijao.jpg")
    );
    let updated = client.products().find_by_code("F-1").await.unwrap().unwrap();
    assert_eq!(updated.price, Decimal::new(899, 2));
    assert_eq!(updated.name, "Feijao Tipo 1");

    // a brand-new code with no image keeps the placeholder
    let fresh = ProductUpsertRow::new("Arroz", "A-1", Decimal::new(1290, 2));
    assert!(client.products().upsert(&[fresh]).await.is_ok());
    assert_eq!(state.product_image("A-1").as_deref(), Some(PLACEHOLDER_IMAGE));
}

#[tokio::test]
async fn order_creation_dedupes_on_idempotency_key() {
    let (url, state) = spawn_fixture().await;
    let client = VitrineClient::new(ClientConfig::rest(url)).unwrap();

    let key = new_idempotency_key();
    let first = client.orders().create(&sample_order(), Some(&key)).await;
    let second = client.orders().create(&sample_order(), Some(&key)).await;

    let first = first.data.expect("first create");
    let second = second.data.expect("second create");
    assert_eq!(first.id, second.id);
    assert_eq!(state.order_count(), 1);
    assert_eq!(state.order_post_hits.load(Ordering::SeqCst), 2);

    // a different key is a different checkout attempt
    let other = client
        .orders()
        .create(&sample_order(), Some(&new_idempotency_key()))
        .await;
    assert_ne!(other.data.expect("third create").id, first.id);
    assert_eq!(state.order_count(), 2);

    let items = client.orders().fetch_items(first.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].total_price, Decimal::new(2500, 2));
}

#[tokio::test]
async fn order_status_update_and_listing() {
    let (url, _state) = spawn_fixture().await;
    let client = VitrineClient::new(ClientConfig::rest(url)).unwrap();

    let created = client.orders().create(&sample_order(), None).await;
    let order = created.data.expect("create order");
    assert_eq!(order.status, OrderStatus::Pending);

    let outcome = client
        .orders()
        .update(
            order.id,
            &OrderUpdate {
                status: Some(OrderStatus::Confirmed),
            },
        )
        .await;
    assert!(outcome.is_ok());

    let listed = client.orders().fetch_all().await.unwrap();
    assert_eq!(listed[0].status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn settings_write_then_read() {
    let (url, _state) = spawn_fixture().await;
    let client = VitrineClient::new(ClientConfig::rest(url)).unwrap();

    assert!(client.settings().update("store_name", "Mercearia Central").await.is_ok());
    let all = client.settings().fetch_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].key, "store_name");
    assert_eq!(all[0].value, "Mercearia Central");
}

#[tokio::test]
async fn reads_fail_hard_but_mutations_report_via_error_slot() {
    // nothing listens here
    let config = ClientConfig::rest("http://127.0.0.1:9")
        .with_timeout(Duration::from_millis(200))
        .with_max_retries(0);
    let client = VitrineClient::new(config).unwrap();

    let read = client.products().fetch_all().await;
    assert!(matches!(
        read,
        Err(ClientError::Network(_) | ClientError::Timeout(_))
    ));

    let write = client.products().remove(1).await;
    assert!(write.error.is_some());

    let created = client.products().insert(&sample_product("X", "X-1")).await;
    assert!(created.data.is_none());
    assert!(created.error.is_some());

    let upload = client.storage().upload_base64("aGVsbG8=", None).await;
    assert!(upload.url.is_none());
    assert!(upload.error.is_some());
}

#[tokio::test]
async fn stalled_server_times_out_and_spends_the_retry_budget() {
    let (url, state) = spawn_fixture().await;
    state.stall_product_list.store(true, Ordering::SeqCst);

    let config = ClientConfig::rest(url)
        .with_timeout(Duration::from_millis(50))
        .with_max_retries(2)
        .with_retry_delay(Duration::from_millis(10));
    let client = VitrineClient::new(config).unwrap();

    let result = client.products().fetch_all().await;
    assert!(matches!(result, Err(ClientError::Timeout(_))));
    // first attempt plus two retries
    assert_eq!(state.product_list_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn malformed_base64_fails_without_touching_the_network() {
    let (url, state) = spawn_fixture().await;
    let client = VitrineClient::new(ClientConfig::rest(url)).unwrap();

    let upload = client.storage().upload_base64("!!!not-base64!!!", None).await;
    assert!(upload.error.is_some());
    assert!(upload.url.is_none());
    // no route was hit
    assert_eq!(state.product_list_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rest_auth_is_a_synthetic_admin() {
    let client = VitrineClient::new(ClientConfig::rest("http://127.0.0.1:9")).unwrap();

    let session = client.auth().session().await.unwrap().unwrap();
    assert!(session.user.is_admin());
    assert!(client.auth().is_admin().await.unwrap());
    assert!(client.auth().logout().await.is_ok());
}
