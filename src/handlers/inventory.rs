use super::common::{
    created_response, success_response, validate_input, PaginatedResponse, PaginationParams,
};
use crate::entities::inventory_movement::{self, MovementType};
use crate::errors::ServiceError;
use crate::services::inventory::{MovementFilter, NewMovement};
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

fn map_movement_type(raw: &str) -> Result<MovementType, ServiceError> {
    match raw.to_ascii_lowercase().as_str() {
        "in" => Ok(MovementType::In),
        "out" => Ok(MovementType::Out),
        "adjustment" => Ok(MovementType::Adjustment),
        "reserved" => Ok(MovementType::Reserved),
        "released" => Ok(MovementType::Released),
        other => Err(ServiceError::InvalidInput(format!(
            "Unknown movement type: {}",
            other
        ))),
    }
}

// Request and response DTOs

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "product_id": "550e8400-e29b-41d4-a716-446655440000",
    "movement_type": "In",
    "quantity": 25,
    "reference_type": "purchase",
    "notes": "Initial receipt"
}))]
pub struct RecordMovementRequest {
    pub product_id: Uuid,
    /// One of In, Out, Adjustment, Reserved, Released (case-insensitive)
    pub movement_type: String,
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub quantity: i32,
    #[validate(length(max = 100, message = "Reference type cannot exceed 100 characters"))]
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
    #[validate(length(max = 255, message = "Created by cannot exceed 255 characters"))]
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementListQuery {
    pub product_id: Option<Uuid>,
    /// Movement type filter (case-insensitive)
    pub movement_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    /// Signed quantity applied to the product's stock
    pub effective_quantity: i32,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<inventory_movement::Model> for MovementResponse {
    fn from(model: inventory_movement::Model) -> Self {
        let effective_quantity = model.effective_quantity();
        Self {
            id: model.id,
            product_id: model.product_id,
            movement_type: model.movement_type,
            quantity: model.quantity,
            effective_quantity,
            reference_type: model.reference_type,
            reference_id: model.reference_id,
            notes: model.notes,
            created_by: model.created_by,
            created_at: model.created_at,
        }
    }
}

// Handler functions

/// Record an inventory movement
#[utoipa::path(
    post,
    path = "/api/v1/inventory/movements",
    request_body = RecordMovementRequest,
    responses(
        (status = 201, description = "Movement recorded and stock adjusted", body = MovementResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn record_movement(
    State(state): State<Arc<AppState>>,
    axum::Json(payload): axum::Json<RecordMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let movement_type = map_movement_type(&payload.movement_type)?;

    let movement = state
        .services
        .inventory
        .record_movement(NewMovement {
            product_id: payload.product_id,
            movement_type,
            quantity: payload.quantity,
            reference_type: payload.reference_type,
            reference_id: payload.reference_id,
            notes: payload.notes,
            created_by: payload.created_by,
        })
        .await?;

    Ok(created_response(MovementResponse::from(movement)))
}

/// Get one ledger row
#[utoipa::path(
    get,
    path = "/api/v1/inventory/movements/{id}",
    params(("id" = Uuid, Path, description = "Movement ID")),
    responses(
        (status = 200, description = "Movement found", body = MovementResponse),
        (status = 404, description = "Movement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_movement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement = state.services.inventory.get_movement(id).await?;
    Ok(success_response(MovementResponse::from(movement)))
}

/// List ledger rows, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory/movements",
    params(PaginationParams, MovementListQuery),
    responses(
        (status = 200, description = "Paginated movement listing", body = PaginatedResponse<MovementResponse>),
        (status = 400, description = "Invalid movement type", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_movements(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<MovementListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement_type = filter
        .movement_type
        .as_deref()
        .map(map_movement_type)
        .transpose()?;

    let (limit, offset) = pagination.limit_offset(&state.config);
    let (movements, total) = state
        .services
        .inventory
        .list_movements(
            MovementFilter {
                product_id: filter.product_id,
                movement_type,
            },
            limit,
            offset,
        )
        .await?;

    let items = movements.into_iter().map(MovementResponse::from).collect();
    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        limit,
    )))
}

/// Ledger history for one product, newest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory/movements/product/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Paginated movement history", body = PaginatedResponse<MovementResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_product_movements(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (limit, offset) = pagination.limit_offset(&state.config);
    let (movements, total) = state
        .services
        .inventory
        .product_movements(product_id, limit, offset)
        .await?;

    let items = movements.into_iter().map(MovementResponse::from).collect();
    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        limit,
    )))
}

pub fn inventory_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movements", post(record_movement).get(list_movements))
        .route("/movements/product/:product_id", get(list_product_movements))
        .route("/movements/:id", get(get_movement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_case::test_case;

    #[test_case("in", MovementType::In)]
    #[test_case("OUT", MovementType::Out)]
    #[test_case("Adjustment", MovementType::Adjustment)]
    #[test_case("reserved", MovementType::Reserved)]
    #[test_case("released", MovementType::Released)]
    fn movement_type_parses_case_insensitively(raw: &str, expected: MovementType) {
        assert_eq!(map_movement_type(raw).unwrap(), expected);
    }

    #[test]
    fn unknown_movement_type_is_rejected() {
        let err = map_movement_type("teleported").unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(_));
    }
}
