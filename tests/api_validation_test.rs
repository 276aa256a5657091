//! Request DTO validation coverage: each vertical's create payload with the
//! edge values the API must reject before any service call happens.

use rstest::rstest;
use rust_decimal_macros::dec;
use souq_api::handlers::brands::CreateBrandRequest;
use souq_api::handlers::inventory::RecordMovementRequest;
use souq_api::handlers::orders::{CreateOrderRequest, OrderItemRequest};
use souq_api::handlers::products::CreateProductRequest;
use souq_api::handlers::users::CreateUserRequest;
use uuid::Uuid;
use validator::Validate;

fn brand_request() -> CreateBrandRequest {
    CreateBrandRequest {
        name: "Acme".into(),
        name_ar: None,
        slug: "acme".into(),
        description: None,
        logo_url: None,
        website_url: None,
        is_active: None,
        sort_order: None,
    }
}

fn product_request() -> CreateProductRequest {
    CreateProductRequest {
        name: "Kettle".into(),
        name_ar: None,
        sku: "KTL-001".into(),
        slug: "kettle".into(),
        description: None,
        category_id: None,
        brand_id: None,
        price: dec!(49.00),
        currency: Some("USD".into()),
        stock_quantity: None,
        min_stock_level: None,
        track_inventory: None,
        image_url: None,
        is_active: None,
        is_featured: None,
        sort_order: None,
    }
}

fn movement_request() -> RecordMovementRequest {
    RecordMovementRequest {
        product_id: Uuid::new_v4(),
        movement_type: "In".into(),
        quantity: 10,
        reference_type: None,
        reference_id: None,
        notes: None,
        created_by: None,
    }
}

fn order_request() -> CreateOrderRequest {
    CreateOrderRequest {
        user_id: Uuid::new_v4(),
        customer_email: "buyer@example.com".into(),
        currency: None,
        notes: None,
        items: vec![OrderItemRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
        }],
    }
}

fn user_request() -> CreateUserRequest {
    CreateUserRequest {
        email: "person@example.com".into(),
        password_hash: "$argon2id$stub".into(),
        first_name: None,
        last_name: None,
        phone: None,
        role: None,
    }
}

#[rstest]
fn baseline_requests_validate() {
    assert!(brand_request().validate().is_ok());
    assert!(product_request().validate().is_ok());
    assert!(movement_request().validate().is_ok());
    assert!(order_request().validate().is_ok());
    assert!(user_request().validate().is_ok());
}

#[rstest]
#[case("")]
#[case("Mixed-Case")]
#[case("double--hyphen")]
#[case("trailing-")]
fn brand_rejects_malformed_slug(#[case] slug: &str) {
    let mut req = brand_request();
    req.slug = slug.into();
    assert!(req.validate().is_err());
}

#[rstest]
fn brand_rejects_blank_name() {
    let mut req = brand_request();
    req.name = String::new();
    assert!(req.validate().is_err());
}

#[rstest]
#[case(-1)]
#[case(10_000)]
fn brand_rejects_out_of_range_sort_order(#[case] sort_order: i32) {
    let mut req = brand_request();
    req.sort_order = Some(sort_order);
    assert!(req.validate().is_err());
}

#[rstest]
fn brand_rejects_malformed_website_url() {
    let mut req = brand_request();
    req.website_url = Some("not a url".into());
    assert!(req.validate().is_err());
}

#[rstest]
fn product_rejects_blank_sku() {
    let mut req = product_request();
    req.sku = String::new();
    assert!(req.validate().is_err());
}

#[rstest]
#[case("US")]
#[case("DOLLARS")]
fn product_rejects_non_three_letter_currency(#[case] currency: &str) {
    let mut req = product_request();
    req.currency = Some(currency.into());
    assert!(req.validate().is_err());
}

#[rstest]
fn product_rejects_overlong_name() {
    let mut req = product_request();
    req.name = "x".repeat(256);
    assert!(req.validate().is_err());
}

#[rstest]
#[case(0)]
#[case(-5)]
fn movement_rejects_non_positive_quantity(#[case] quantity: i32) {
    let mut req = movement_request();
    req.quantity = quantity;
    assert!(req.validate().is_err());
}

#[rstest]
fn order_rejects_empty_item_list() {
    let mut req = order_request();
    req.items.clear();
    assert!(req.validate().is_err());
}

#[rstest]
fn order_rejects_malformed_email() {
    let mut req = order_request();
    req.customer_email = "not-an-email".into();
    assert!(req.validate().is_err());
}

#[rstest]
fn order_rejects_non_three_letter_currency() {
    let mut req = order_request();
    req.currency = Some("USDT".into());
    assert!(req.validate().is_err());
}

#[rstest]
fn user_rejects_malformed_email() {
    let mut req = user_request();
    req.email = "at-sign-missing.example.com".into();
    assert!(req.validate().is_err());
}

#[rstest]
fn user_rejects_empty_password_hash() {
    let mut req = user_request();
    req.password_hash = String::new();
    assert!(req.validate().is_err());
}

#[rstest]
fn user_rejects_overlong_phone() {
    let mut req = user_request();
    req.phone = Some("0".repeat(31));
    assert!(req.validate().is_err());
}
