//! Property-based checks for the pure domain rules: slug shape, ledger
//! signing, stock predicates, and pagination arithmetic.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal_macros::dec;
use souq_api::config::AppConfig;
use souq_api::entities::inventory_movement::{self, MovementType};
use souq_api::entities::product;
use souq_api::handlers::common::{validate_slug, PaginatedResponse, PaginationParams};
use uuid::Uuid;

fn test_config() -> AppConfig {
    config::Config::builder()
        .set_default("database_url", "sqlite::memory:")
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

fn movement(movement_type: MovementType, quantity: i32) -> inventory_movement::Model {
    inventory_movement::Model {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        movement_type,
        quantity,
        reference_type: None,
        reference_id: None,
        notes: None,
        created_by: None,
        created_at: Utc::now(),
    }
}

fn tracked_product(stock: i32, min_level: i32) -> product::Model {
    product::Model {
        id: Uuid::new_v4(),
        name: "Widget".into(),
        name_ar: None,
        sku: "SKU-1".into(),
        slug: "widget".into(),
        description: None,
        category_id: None,
        brand_id: None,
        price: dec!(9.99),
        currency: "USD".into(),
        stock_quantity: stock,
        min_stock_level: min_level,
        track_inventory: true,
        image_url: None,
        is_active: true,
        is_featured: false,
        sort_order: 0,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn movement_type_strategy() -> impl Strategy<Value = MovementType> {
    prop_oneof![
        Just(MovementType::In),
        Just(MovementType::Out),
        Just(MovementType::Adjustment),
        Just(MovementType::Reserved),
        Just(MovementType::Released),
    ]
}

proptest! {
    #[test]
    fn generated_slugs_validate(slug in "[a-z0-9]{1,12}(-[a-z0-9]{1,12}){0,4}") {
        prop_assert!(validate_slug(&slug).is_ok());
    }

    #[test]
    fn slugs_with_forbidden_characters_fail(
        prefix in "[a-z0-9]{0,6}",
        bad in "[A-Z_ .@/]{1,4}",
        suffix in "[a-z0-9]{0,6}",
    ) {
        let slug = format!("{}{}{}", prefix, bad, suffix);
        prop_assert!(validate_slug(&slug).is_err());
    }

    #[test]
    fn effective_quantity_preserves_magnitude(
        movement_type in movement_type_strategy(),
        quantity in 1..=100_000i32,
    ) {
        let m = movement(movement_type, quantity);
        let effective = m.effective_quantity();

        prop_assert_eq!(effective.abs(), quantity);
        match movement_type {
            MovementType::Out | MovementType::Reserved => prop_assert!(effective < 0),
            _ => prop_assert!(effective > 0),
        }
    }

    #[test]
    fn out_of_stock_implies_low_stock(
        stock in -1_000..=1_000i32,
        min_level in 0..=1_000i32,
    ) {
        let p = tracked_product(stock, min_level);
        if p.is_out_of_stock() {
            prop_assert!(p.is_low_stock());
        }
    }

    #[test]
    fn total_pages_covers_the_listing(
        total in 0..=100_000u64,
        limit in 1..=100u64,
    ) {
        let response: PaginatedResponse<String> =
            PaginatedResponse::new(vec![], total, 1, limit);

        // Enough pages to hold every row, and no trailing empty page
        prop_assert!(response.total_pages * limit >= total);
        if total > 0 {
            prop_assert!((response.total_pages - 1) * limit < total);
        } else {
            prop_assert_eq!(response.total_pages, 0);
        }
    }

    #[test]
    fn clamped_page_size_stays_within_bounds(requested in 0..=100_000u32) {
        let cfg = test_config();
        let clamped = cfg.clamp_page_size(requested);

        prop_assert!(clamped >= 1);
        prop_assert!(clamped <= cfg.api_max_page_size);
        if requested == 0 {
            prop_assert_eq!(clamped, cfg.api_default_page_size);
        } else if requested <= cfg.api_max_page_size {
            prop_assert_eq!(clamped, requested);
        }
    }

    #[test]
    fn offset_is_consistent_with_page_and_limit(
        page in 1..=10_000u64,
        per_page in 0..=500u32,
    ) {
        let cfg = test_config();
        let params = PaginationParams { page, per_page };
        let (limit, offset) = params.limit_offset(&cfg);

        prop_assert_eq!(offset, (page - 1) * limit);
    }
}
