use super::common::{
    created_response, success_response, validate_input, PaginatedResponse, PaginationParams,
};
use crate::entities::order::{self, OrderStatus, PaymentStatus};
use crate::entities::order_item;
use crate::errors::ServiceError;
use crate::services::orders::{NewOrder, NewOrderItem, OrderFilter, OrderStats};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
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

fn map_status_str(raw: &str) -> Result<OrderStatus, ServiceError> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" => Ok(OrderStatus::Pending),
        "processing" => Ok(OrderStatus::Processing),
        "shipped" => Ok(OrderStatus::Shipped),
        "delivered" => Ok(OrderStatus::Delivered),
        "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
        other => Err(ServiceError::InvalidInput(format!(
            "Unknown order status: {}",
            other
        ))),
    }
}

fn map_payment_status_str(raw: &str) -> Result<PaymentStatus, ServiceError> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" => Ok(PaymentStatus::Pending),
        "paid" => Ok(PaymentStatus::Paid),
        "failed" => Ok(PaymentStatus::Failed),
        "refunded" => Ok(PaymentStatus::Refunded),
        other => Err(ServiceError::InvalidInput(format!(
            "Unknown payment status: {}",
            other
        ))),
    }
}

// Request and response DTOs

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "user_id": "550e8400-e29b-41d4-a716-446655440000",
    "customer_email": "buyer@example.com",
    "items": [{ "product_id": "7f9c24e5-2f02-4c71-9c9f-0f1f6ad41a48", "quantity": 2 }]
}))]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    #[validate(email(message = "Customer email must be a valid email address"))]
    pub customer_email: String,
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,
    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
    /// Line quantities are re-checked service-side
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// One of pending, processing, shipped, delivered, cancelled
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStatusRequest {
    /// One of pending, paid, failed, refunded
    pub payment_status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    /// Order status filter (case-insensitive)
    pub status: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_name: model.product_name,
            quantity: model.quantity,
            unit_price: model.unit_price,
            total_price: model.total_price,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub customer_email: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemResponse>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderResponse {
    fn from_model(model: order::Model, items: Option<Vec<order_item::Model>>) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            status: model.status,
            payment_status: model.payment_status,
            customer_email: model.customer_email,
            total_amount: model.total_amount,
            currency: model.currency,
            notes: model.notes,
            items: items.map(|items| items.into_iter().map(OrderItemResponse::from).collect()),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

// Handler functions

/// Create a new order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "User or product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    axum::Json(payload): axum::Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let items = payload
        .items
        .into_iter()
        .map(|item| NewOrderItem {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();

    let (order, lines) = state
        .services
        .orders
        .create_order(NewOrder {
            user_id: payload.user_id,
            customer_email: payload.customer_email,
            currency: payload.currency,
            notes: payload.notes,
            items,
        })
        .await?;

    Ok(created_response(OrderResponse::from_model(
        order,
        Some(lines),
    )))
}

/// Get an order with its items
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let (order, items) = state.services.orders.get_order_with_items(id).await?;
    Ok(success_response(OrderResponse::from_model(
        order,
        Some(items),
    )))
}

/// Get an order by its display number
#[utoipa::path(
    get,
    path = "/api/v1/orders/number/{order_number}",
    params(("order_number" = String, Path, description = "Order number")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order_by_number(
    State(state): State<Arc<AppState>>,
    Path(order_number): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .get_order_by_number(&order_number)
        .await?;
    let (order, items) = state.services.orders.get_order_with_items(order.id).await?;
    Ok(success_response(OrderResponse::from_model(
        order,
        Some(items),
    )))
}

/// List orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(PaginationParams, OrderListQuery),
    responses(
        (status = 200, description = "Paginated order listing", body = PaginatedResponse<OrderResponse>),
        (status = 400, description = "Invalid status filter", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = filter.status.as_deref().map(map_status_str).transpose()?;

    let (limit, offset) = pagination.limit_offset(&state.config);
    let (orders, total) = state
        .services
        .orders
        .list_orders(
            OrderFilter {
                status,
                user_id: filter.user_id,
            },
            limit,
            offset,
        )
        .await?;

    let items = orders
        .into_iter()
        .map(|order| OrderResponse::from_model(order, None))
        .collect();
    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        limit,
    )))
}

/// Order counts grouped by status
#[utoipa::path(
    get,
    path = "/api/v1/orders/stats",
    responses(
        (status = 200, description = "Order statistics", body = OrderStats)
    ),
    tag = "orders"
)]
pub async fn get_order_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let stats = state.services.orders.order_stats().await?;
    Ok(success_response(stats))
}

/// Update an order's status
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = map_status_str(&payload.status)?;
    let order = state.services.orders.update_order_status(id, status).await?;
    Ok(success_response(OrderResponse::from_model(order, None)))
}

/// Update an order's payment status
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/payment-status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status updated", body = OrderResponse),
        (status = 400, description = "Unknown payment status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_payment_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdatePaymentStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let payment_status = map_payment_status_str(&payload.payment_status)?;
    let order = state
        .services
        .orders
        .update_payment_status(id, payment_status)
        .await?;
    Ok(success_response(OrderResponse::from_model(order, None)))
}

/// Cancel an order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled", body = OrderResponse),
        (status = 400, description = "Order cannot be cancelled", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.cancel_order(id).await?;
    Ok(success_response(OrderResponse::from_model(order, None)))
}

pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/stats", get(get_order_stats))
        .route("/number/:order_number", get(get_order_by_number))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
        .route("/:id/payment-status", put(update_payment_status))
        .route("/:id/cancel", post(cancel_order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use test_case::test_case;

    #[test_case("pending", OrderStatus::Pending)]
    #[test_case("PROCESSING", OrderStatus::Processing)]
    #[test_case("shipped", OrderStatus::Shipped)]
    #[test_case("delivered", OrderStatus::Delivered)]
    #[test_case("cancelled", OrderStatus::Cancelled)]
    #[test_case("canceled", OrderStatus::Cancelled; "us spelling")]
    fn order_status_parses_case_insensitively(raw: &str, expected: OrderStatus) {
        assert_eq!(map_status_str(raw).unwrap(), expected);
    }

    #[test]
    fn unknown_order_status_is_rejected() {
        assert_matches!(map_status_str("lost"), Err(ServiceError::InvalidInput(_)));
    }

    #[test_case("paid", PaymentStatus::Paid)]
    #[test_case("REFUNDED", PaymentStatus::Refunded)]
    fn payment_status_parses_case_insensitively(raw: &str, expected: PaymentStatus) {
        assert_eq!(map_payment_status_str(raw).unwrap(), expected);
    }
}
