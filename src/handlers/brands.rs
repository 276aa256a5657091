use super::common::{
    created_response, no_content_response, success_response, validate_input, validate_slug,
    PaginatedResponse, PaginationParams,
};
use crate::entities::brand;
use crate::errors::ServiceError;
use crate::services::brands::{BrandFilter, BrandPatch, NewBrand};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Request and response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Acme",
    "slug": "acme",
    "website_url": "https://acme.example.com",
    "sort_order": 10
}))]
pub struct CreateBrandRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[validate(length(max = 255, message = "Arabic name cannot exceed 255 characters"))]
    pub name_ar: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
    #[validate(url(message = "Website URL must be a valid URL"))]
    pub website_url: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0, max = 9999, message = "Sort order must be between 0 and 9999"))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBrandRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "Arabic name cannot exceed 255 characters"))]
    pub name_ar: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
    #[validate(url(message = "Website URL must be a valid URL"))]
    pub website_url: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0, max = 9999, message = "Sort order must be between 0 and 9999"))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BrandListQuery {
    /// Substring match against name and slug
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandResponse {
    pub id: Uuid,
    pub name: String,
    pub name_ar: Option<String>,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub product_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BrandResponse {
    fn from_model(model: brand::Model, product_count: u64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            name_ar: model.name_ar,
            slug: model.slug,
            description: model.description,
            logo_url: model.logo_url,
            website_url: model.website_url,
            is_active: model.is_active,
            sort_order: model.sort_order,
            product_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

// Handler functions

/// Create a new brand
#[utoipa::path(
    post,
    path = "/api/v1/brands",
    request_body = CreateBrandRequest,
    responses(
        (status = 201, description = "Brand created", body = BrandResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "brands"
)]
pub async fn create_brand(
    State(state): State<Arc<AppState>>,
    axum::Json(payload): axum::Json<CreateBrandRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let brand = state
        .services
        .brands
        .create_brand(NewBrand {
            name: payload.name,
            name_ar: payload.name_ar,
            slug: payload.slug,
            description: payload.description,
            logo_url: payload.logo_url,
            website_url: payload.website_url,
            is_active: payload.is_active,
            sort_order: payload.sort_order,
        })
        .await?;

    Ok(created_response(BrandResponse::from_model(brand, 0)))
}

/// Get a brand by ID
#[utoipa::path(
    get,
    path = "/api/v1/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand found", body = BrandResponse),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse)
    ),
    tag = "brands"
)]
pub async fn get_brand(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let brand = state.services.brands.get_brand(id).await?;
    let product_count = state.services.brands.count_products(id).await?;
    Ok(success_response(BrandResponse::from_model(
        brand,
        product_count,
    )))
}

/// Get a brand by slug
#[utoipa::path(
    get,
    path = "/api/v1/brands/slug/{slug}",
    params(("slug" = String, Path, description = "Brand slug")),
    responses(
        (status = 200, description = "Brand found", body = BrandResponse),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse)
    ),
    tag = "brands"
)]
pub async fn get_brand_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let brand = state.services.brands.get_brand_by_slug(&slug).await?;
    let product_count = state.services.brands.count_products(brand.id).await?;
    Ok(success_response(BrandResponse::from_model(
        brand,
        product_count,
    )))
}

/// List brands
#[utoipa::path(
    get,
    path = "/api/v1/brands",
    params(PaginationParams, BrandListQuery),
    responses(
        (status = 200, description = "Paginated brand listing", body = PaginatedResponse<BrandResponse>)
    ),
    tag = "brands"
)]
pub async fn list_brands(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<BrandListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (limit, offset) = pagination.limit_offset(&state.config);
    let (rows, total) = state
        .services
        .brands
        .list_brands(
            BrandFilter {
                search: filter.search,
                is_active: filter.is_active,
            },
            limit,
            offset,
        )
        .await?;

    let items = rows
        .into_iter()
        .map(|(brand, count)| BrandResponse::from_model(brand, count))
        .collect();
    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        limit,
    )))
}

/// Update a brand
#[utoipa::path(
    put,
    path = "/api/v1/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    request_body = UpdateBrandRequest,
    responses(
        (status = 200, description = "Brand updated", body = BrandResponse),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "brands"
)]
pub async fn update_brand(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateBrandRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let brand = state
        .services
        .brands
        .update_brand(
            id,
            BrandPatch {
                name: payload.name,
                name_ar: payload.name_ar,
                slug: payload.slug,
                description: payload.description,
                logo_url: payload.logo_url,
                website_url: payload.website_url,
                is_active: payload.is_active,
                sort_order: payload.sort_order,
            },
        )
        .await?;

    let product_count = state.services.brands.count_products(id).await?;
    Ok(success_response(BrandResponse::from_model(
        brand,
        product_count,
    )))
}

/// Delete a brand
#[utoipa::path(
    delete,
    path = "/api/v1/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 204, description = "Brand deleted"),
        (status = 404, description = "Brand not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Brand still has products", body = crate::errors::ErrorResponse)
    ),
    tag = "brands"
)]
pub async fn delete_brand(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.brands.delete_brand(id).await?;
    Ok(no_content_response())
}

pub fn brand_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_brand).get(list_brands))
        .route(
            "/:id",
            get(get_brand).put(update_brand).delete(delete_brand),
        )
        .route("/slug/:slug", get(get_brand_by_slug))
}
