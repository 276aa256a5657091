use super::common::{
    created_response, no_content_response, success_response, validate_input, validate_slug,
    PaginatedResponse, PaginationParams,
};
use crate::entities::product;
use crate::errors::ServiceError;
use crate::services::products::{NewProduct, ProductFilter, ProductPatch};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Request and response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "4K Monitor",
    "sku": "MON-4K-27",
    "slug": "4k-monitor-27",
    "price": "349.99",
    "stock_quantity": 40,
    "min_stock_level": 5
}))]
pub struct CreateProductRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[validate(length(max = 255, message = "Arabic name cannot exceed 255 characters"))]
    pub name_ar: Option<String>,
    #[validate(length(
        min = 1,
        max = 100,
        message = "SKU must be between 1 and 100 characters"
    ))]
    pub sku: String,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    /// Non-negative selling price
    pub price: Decimal,
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,
    pub stock_quantity: Option<i32>,
    pub min_stock_level: Option<i32>,
    pub track_inventory: Option<bool>,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    #[validate(range(min = 0, max = 9999, message = "Sort order must be between 0 and 9999"))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "Arabic name cannot exceed 255 characters"))]
    pub name_ar: Option<String>,
    #[validate(length(
        min = 1,
        max = 100,
        message = "SKU must be between 1 and 100 characters"
    ))]
    pub sku: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub price: Option<Decimal>,
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,
    pub min_stock_level: Option<i32>,
    pub track_inventory: Option<bool>,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
    pub is_featured: Option<bool>,
    #[validate(range(min = 0, max = 9999, message = "Sort order must be between 0 and 9999"))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    /// Substring match against name, slug, and SKU
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub name_ar: Option<String>,
    pub sku: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub price: Decimal,
    pub currency: String,
    pub stock_quantity: i32,
    pub min_stock_level: i32,
    pub track_inventory: bool,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_low_stock: bool,
    pub is_out_of_stock: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        let is_low_stock = model.is_low_stock();
        let is_out_of_stock = model.is_out_of_stock();
        Self {
            id: model.id,
            name: model.name,
            name_ar: model.name_ar,
            sku: model.sku,
            slug: model.slug,
            description: model.description,
            category_id: model.category_id,
            brand_id: model.brand_id,
            price: model.price,
            currency: model.currency,
            stock_quantity: model.stock_quantity,
            min_stock_level: model.min_stock_level,
            track_inventory: model.track_inventory,
            image_url: model.image_url,
            is_active: model.is_active,
            is_featured: model.is_featured,
            is_low_stock,
            is_out_of_stock,
            sort_order: model.sort_order,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

// Handler functions

/// Create a new product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU or slug already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    axum::Json(payload): axum::Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .create_product(NewProduct {
            name: payload.name,
            name_ar: payload.name_ar,
            sku: payload.sku,
            slug: payload.slug,
            description: payload.description,
            category_id: payload.category_id,
            brand_id: payload.brand_id,
            price: payload.price,
            currency: payload.currency,
            stock_quantity: payload.stock_quantity,
            min_stock_level: payload.min_stock_level,
            track_inventory: payload.track_inventory,
            image_url: payload.image_url,
            is_active: payload.is_active,
            is_featured: payload.is_featured,
            sort_order: payload.sort_order,
        })
        .await?;

    Ok(created_response(ProductResponse::from(product)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.get_product(id).await?;
    Ok(success_response(ProductResponse::from(product)))
}

/// Get a product by slug
#[utoipa::path(
    get,
    path = "/api/v1/products/slug/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.get_product_by_slug(&slug).await?;
    Ok(success_response(ProductResponse::from(product)))
}

/// Get a product by SKU
#[utoipa::path(
    get,
    path = "/api/v1/products/sku/{sku}",
    params(("sku" = String, Path, description = "Product SKU")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product_by_sku(
    State(state): State<Arc<AppState>>,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.get_product_by_sku(&sku).await?;
    Ok(success_response(ProductResponse::from(product)))
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams, ProductListQuery),
    responses(
        (status = 200, description = "Paginated product listing", body = PaginatedResponse<ProductResponse>)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (limit, offset) = pagination.limit_offset(&state.config);
    let (products, total) = state
        .services
        .products
        .list_products(
            ProductFilter {
                search: filter.search,
                category_id: filter.category_id,
                brand_id: filter.brand_id,
                is_active: filter.is_active,
                is_featured: filter.is_featured,
            },
            limit,
            offset,
        )
        .await?;

    let items = products.into_iter().map(ProductResponse::from).collect();
    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        limit,
    )))
}

/// List tracked products at or below their minimum stock level
#[utoipa::path(
    get,
    path = "/api/v1/products/low-stock",
    responses(
        (status = 200, description = "Low-stock products", body = [ProductResponse])
    ),
    tag = "products"
)]
pub async fn list_low_stock(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.products.list_low_stock().await?;
    let items: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(success_response(items))
}

/// List tracked products with nothing on hand
#[utoipa::path(
    get,
    path = "/api/v1/products/out-of-stock",
    responses(
        (status = 200, description = "Out-of-stock products", body = [ProductResponse])
    ),
    tag = "products"
)]
pub async fn list_out_of_stock(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.products.list_out_of_stock().await?;
    let items: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(success_response(items))
}

/// List featured products
#[utoipa::path(
    get,
    path = "/api/v1/products/featured",
    responses(
        (status = 200, description = "Featured products", body = [ProductResponse])
    ),
    tag = "products"
)]
pub async fn list_featured(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.products.list_featured().await?;
    let items: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(success_response(items))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU or slug already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .update_product(
            id,
            ProductPatch {
                name: payload.name,
                name_ar: payload.name_ar,
                sku: payload.sku,
                slug: payload.slug,
                description: payload.description,
                category_id: payload.category_id,
                brand_id: payload.brand_id,
                price: payload.price,
                currency: payload.currency,
                min_stock_level: payload.min_stock_level,
                track_inventory: payload.track_inventory,
                image_url: payload.image_url,
                is_featured: payload.is_featured,
                sort_order: payload.sort_order,
            },
        )
        .await?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Activate a product
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/activate",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product activated", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn activate_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.set_product_active(id, true).await?;
    Ok(success_response(ProductResponse::from(product)))
}

/// Deactivate a product
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deactivated", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn deactivate_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .services
        .products
        .set_product_active(id, false)
        .await?;
    Ok(success_response(ProductResponse::from(product)))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Product still referenced by orders or the ledger", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.products.delete_product(id).await?;
    Ok(no_content_response())
}

pub fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/low-stock", get(list_low_stock))
        .route("/out-of-stock", get(list_out_of_stock))
        .route("/featured", get(list_featured))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/activate", post(activate_product))
        .route("/:id/deactivate", post(deactivate_product))
        .route("/slug/:slug", get(get_product_by_slug))
        .route("/sku/:sku", get(get_product_by_sku))
}
