use super::common::{
    created_response, no_content_response, success_response, validate_input, validate_slug,
    PaginatedResponse, PaginationParams,
};
use crate::entities::category;
use crate::errors::ServiceError;
use crate::services::categories::{CategoryFilter, CategoryPatch, NewCategory, ParentChange};
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
    "name": "Electronics",
    "slug": "electronics",
    "icon": "bolt",
    "sort_order": 1
}))]
pub struct CreateCategoryRequest {
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
    /// Parent category; omit for a root category
    pub parent_id: Option<Uuid>,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
    #[validate(length(max = 100, message = "Icon cannot exceed 100 characters"))]
    pub icon: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0, max = 9999, message = "Sort order must be between 0 and 9999"))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
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
    /// Move under another category
    pub parent_id: Option<Uuid>,
    /// Detach from the current parent and make the category a root
    #[serde(default)]
    pub make_root: bool,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
    #[validate(length(max = 100, message = "Icon cannot exceed 100 characters"))]
    pub icon: Option<String>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0, max = 9999, message = "Sort order must be between 0 and 9999"))]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryListQuery {
    /// Substring match against name and slug
    pub search: Option<String>,
    pub is_active: Option<bool>,
    /// Only direct children of this category
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub name_ar: Option<String>,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub product_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CategoryResponse {
    fn from_model(model: category::Model, product_count: u64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            name_ar: model.name_ar,
            slug: model.slug,
            parent_id: model.parent_id,
            image_url: model.image_url,
            icon: model.icon,
            is_active: model.is_active,
            sort_order: model.sort_order,
            product_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// One row of the flat tree listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub name_ar: Option<String>,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub is_root: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryTreeResponse {
    /// All categories, roots first
    pub categories: Vec<CategoryNode>,
    pub total_count: usize,
    pub active_count: usize,
    pub parent_count: usize,
    pub child_count: usize,
}

// Handler functions

/// Create a new category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    axum::Json(payload): axum::Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let category = state
        .services
        .categories
        .create_category(NewCategory {
            name: payload.name,
            name_ar: payload.name_ar,
            slug: payload.slug,
            parent_id: payload.parent_id,
            image_url: payload.image_url,
            icon: payload.icon,
            is_active: payload.is_active,
            sort_order: payload.sort_order,
        })
        .await?;

    Ok(created_response(CategoryResponse::from_model(category, 0)))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = CategoryResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.get_category(id).await?;
    let product_count = state.services.categories.count_products(id).await?;
    Ok(success_response(CategoryResponse::from_model(
        category,
        product_count,
    )))
}

/// Get a category by slug
#[utoipa::path(
    get,
    path = "/api/v1/categories/slug/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category found", body = CategoryResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn get_category_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state
        .services
        .categories
        .get_category_by_slug(&slug)
        .await?;
    let product_count = state
        .services
        .categories
        .count_products(category.id)
        .await?;
    Ok(success_response(CategoryResponse::from_model(
        category,
        product_count,
    )))
}

/// List categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(PaginationParams, CategoryListQuery),
    responses(
        (status = 200, description = "Paginated category listing", body = PaginatedResponse<CategoryResponse>)
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<CategoryListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (limit, offset) = pagination.limit_offset(&state.config);
    let (rows, total) = state
        .services
        .categories
        .list_categories(
            CategoryFilter {
                search: filter.search,
                is_active: filter.is_active,
                parent_id: filter.parent_id,
            },
            limit,
            offset,
        )
        .await?;

    let items = rows
        .into_iter()
        .map(|(category, count)| CategoryResponse::from_model(category, count))
        .collect();
    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        limit,
    )))
}

/// Get the full category tree
#[utoipa::path(
    get,
    path = "/api/v1/categories/tree",
    responses(
        (status = 200, description = "Flat category tree with derived counts", body = CategoryTreeResponse)
    ),
    tag = "categories"
)]
pub async fn get_category_tree(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let tree = state.services.categories.category_tree().await?;

    let categories = tree
        .categories
        .into_iter()
        .map(|model| CategoryNode {
            id: model.id,
            name: model.name,
            name_ar: model.name_ar,
            slug: model.slug,
            parent_id: model.parent_id,
            icon: model.icon,
            is_active: model.is_active,
            sort_order: model.sort_order,
            is_root: model.parent_id.is_none(),
        })
        .collect();

    Ok(success_response(CategoryTreeResponse {
        categories,
        total_count: tree.total_count,
        active_count: tree.active_count,
        parent_count: tree.parent_count,
        child_count: tree.child_count,
    }))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    if payload.make_root && payload.parent_id.is_some() {
        return Err(ServiceError::InvalidInput(
            "Cannot set parent_id and make_root together".to_string(),
        ));
    }
    let parent_change = if payload.make_root {
        Some(ParentChange::Root)
    } else {
        payload.parent_id.map(ParentChange::To)
    };

    let category = state
        .services
        .categories
        .update_category(
            id,
            CategoryPatch {
                name: payload.name,
                name_ar: payload.name_ar,
                slug: payload.slug,
                parent_id: parent_change,
                image_url: payload.image_url,
                icon: payload.icon,
                is_active: payload.is_active,
                sort_order: payload.sort_order,
            },
        )
        .await?;

    let product_count = state.services.categories.count_products(id).await?;
    Ok(success_response(CategoryResponse::from_model(
        category,
        product_count,
    )))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has children or products", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.categories.delete_category(id).await?;
    Ok(no_content_response())
}

pub fn category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route("/tree", get(get_category_tree))
        .route(
            "/:id",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/slug/:slug", get(get_category_by_slug))
}
