use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Souq API",
        version = env!("CARGO_PKG_VERSION"),
        description = r#"
Multi-store e-commerce backend: catalog (brands, categories, products),
inventory movement ledger, orders, and users.

## Rate limiting

Requests are rate-limited per client IP. Check the response headers:
- `X-RateLimit-Limit`: maximum requests per window
- `X-RateLimit-Remaining`: remaining requests in the current window
- `X-RateLimit-Reset`: seconds until the window resets

## Pagination

List endpoints accept `page` (1-based) and `per_page` (default 20, max 100).
"#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "brands", description = "Brand management"),
        (name = "categories", description = "Category management and tree"),
        (name = "products", description = "Product catalog"),
        (name = "inventory", description = "Inventory movement ledger"),
        (name = "orders", description = "Order management"),
        (name = "users", description = "User management"),
        (name = "health", description = "Health and status")
    ),
    paths(
        // Brands
        crate::handlers::brands::create_brand,
        crate::handlers::brands::get_brand,
        crate::handlers::brands::get_brand_by_slug,
        crate::handlers::brands::list_brands,
        crate::handlers::brands::update_brand,
        crate::handlers::brands::delete_brand,

        // Categories
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::get_category_by_slug,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category_tree,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::get_product_by_slug,
        crate::handlers::products::get_product_by_sku,
        crate::handlers::products::list_products,
        crate::handlers::products::list_low_stock,
        crate::handlers::products::list_out_of_stock,
        crate::handlers::products::list_featured,
        crate::handlers::products::update_product,
        crate::handlers::products::activate_product,
        crate::handlers::products::deactivate_product,
        crate::handlers::products::delete_product,

        // Inventory
        crate::handlers::inventory::record_movement,
        crate::handlers::inventory::get_movement,
        crate::handlers::inventory::list_movements,
        crate::handlers::inventory::list_product_movements,

        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::get_order_by_number,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order_stats,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::update_payment_status,
        crate::handlers::orders::cancel_order,

        // Users
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::get_user_by_email,
        crate::handlers::users::list_users,
        crate::handlers::users::update_user,
        crate::handlers::users::activate_user,
        crate::handlers::users::deactivate_user,

        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::api_status,
    ),
    components(
        schemas(
            crate::handlers::brands::CreateBrandRequest,
            crate::handlers::brands::UpdateBrandRequest,
            crate::handlers::brands::BrandResponse,

            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::UpdateCategoryRequest,
            crate::handlers::categories::CategoryResponse,
            crate::handlers::categories::CategoryNode,
            crate::handlers::categories::CategoryTreeResponse,

            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,
            crate::handlers::products::ProductResponse,

            crate::handlers::inventory::RecordMovementRequest,
            crate::handlers::inventory::MovementResponse,
            crate::entities::inventory_movement::MovementType,

            crate::handlers::orders::CreateOrderRequest,
            crate::handlers::orders::OrderItemRequest,
            crate::handlers::orders::UpdateOrderStatusRequest,
            crate::handlers::orders::UpdatePaymentStatusRequest,
            crate::handlers::orders::OrderResponse,
            crate::handlers::orders::OrderItemResponse,
            crate::services::orders::OrderStats,
            crate::entities::order::OrderStatus,
            crate::entities::order::PaymentStatus,

            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UpdateUserRequest,
            crate::handlers::users::UserResponse,
            crate::entities::user::UserRole,

            crate::handlers::health::HealthResponse,
            crate::handlers::health::StatusResponse,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_all_verticals() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        for path in [
            "/api/v1/brands",
            "/api/v1/categories/tree",
            "/api/v1/products/low-stock",
            "/api/v1/inventory/movements",
            "/api/v1/orders/stats",
            "/api/v1/users",
        ] {
            assert!(json.contains(path), "missing path: {}", path);
        }
    }
}
