use super::common::{
    created_response, success_response, validate_input, PaginatedResponse, PaginationParams,
};
use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;
use crate::services::users::{NewUser, UserFilter, UserPatch};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
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
    "email": "buyer@example.com",
    "password_hash": "$argon2id$v=19$m=65536,t=2,p=1$...",
    "first_name": "Aisha",
    "role": "customer"
}))]
pub struct CreateUserRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    /// Already-hashed password; this service never hashes
    #[validate(length(
        min = 1,
        max = 255,
        message = "Password hash must be between 1 and 255 characters"
    ))]
    pub password_hash: String,
    #[validate(length(max = 100, message = "First name cannot exceed 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name cannot exceed 100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 30, message = "Phone cannot exceed 30 characters"))]
    pub phone: Option<String>,
    /// One of customer, admin, super_admin, merchant (case-insensitive);
    /// defaults to customer
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(
        min = 1,
        max = 255,
        message = "Password hash must be between 1 and 255 characters"
    ))]
    pub password_hash: Option<String>,
    #[validate(length(max = 100, message = "First name cannot exceed 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name cannot exceed 100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 30, message = "Phone cannot exceed 30 characters"))]
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListQuery {
    /// Role filter (case-insensitive)
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// User representation returned by the API; the password hash never leaves
/// the service.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            role: model.role,
            is_active: model.is_active,
            is_verified: model.is_verified,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

// Handler functions

/// Create a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    axum::Json(payload): axum::Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let role = payload
        .role
        .as_deref()
        .map(UserRole::from_value)
        .transpose()?;

    let user = state
        .services
        .users
        .create_user(NewUser {
            email: payload.email,
            password_hash: payload.password_hash,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            role,
        })
        .await?;

    Ok(created_response(UserResponse::from(user)))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.get_user(id).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// Get a user by email
#[utoipa::path(
    get,
    path = "/api/v1/users/email/{email}",
    params(("email" = String, Path, description = "Email address")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user_by_email(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.get_user_by_email(&email).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PaginationParams, UserListQuery),
    responses(
        (status = 200, description = "Paginated user listing", body = PaginatedResponse<UserResponse>),
        (status = 400, description = "Unknown role filter", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<UserListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let role = filter
        .role
        .as_deref()
        .map(UserRole::from_value)
        .transpose()?;

    let (limit, offset) = pagination.limit_offset(&state.config);
    let (users, total) = state
        .services
        .users
        .list_users(
            UserFilter {
                role,
                is_active: filter.is_active,
            },
            limit,
            offset,
        )
        .await?;

    let items = users.into_iter().map(UserResponse::from).collect();
    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        limit,
    )))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let role = payload
        .role
        .as_deref()
        .map(UserRole::from_value)
        .transpose()?;

    let user = state
        .services
        .users
        .update_user(
            id,
            UserPatch {
                email: payload.email,
                password_hash: payload.password_hash,
                first_name: payload.first_name,
                last_name: payload.last_name,
                phone: payload.phone,
                role,
                is_verified: payload.is_verified,
            },
        )
        .await?;

    Ok(success_response(UserResponse::from(user)))
}

/// Activate a user
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/activate",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User activated", body = UserResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.set_user_active(id, true).await?;
    Ok(success_response(UserResponse::from(user)))
}

/// Deactivate a user (soft delete)
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/deactivate",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deactivated", body = UserResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.set_user_active(id, false).await?;
    Ok(success_response(UserResponse::from(user)))
}

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/:id", get(get_user).put(update_user))
        .route("/:id/activate", post(activate_user))
        .route("/:id/deactivate", post(deactivate_user))
        .route("/email/:email", get(get_user_by_email))
}
