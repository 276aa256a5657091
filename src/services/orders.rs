use crate::entities::order::{self, OrderStatus, PaymentStatus};
use crate::entities::{order_item, product, user};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub customer_email: String,
    pub currency: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user_id: Option<Uuid>,
}

/// Order counts grouped by status.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct OrderStats {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub shipped: u64,
    pub delivered: u64,
    pub cancelled: u64,
}

/// Service for managing orders
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_currency: String,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        default_currency: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_currency,
        }
    }

    fn generate_order_number() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "ORD-{}-{}",
            Utc::now().format("%Y%m%d"),
            &suffix[..8].to_uppercase()
        )
    }

    /// Creates an order with its line items. Product name and unit price are
    /// snapshotted onto each line; the order total is the sum of line totals.
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        input: NewOrder,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Order must contain at least one item".to_string(),
            ));
        }
        for item in &input.items {
            if item.quantity < 1 {
                return Err(ServiceError::InvalidInput(
                    "Item quantity must be at least 1".to_string(),
                ));
            }
        }

        user::Entity::find_by_id(input.user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", input.user_id)))?;

        let txn = self.db.begin().await?;

        let order_id = Uuid::new_v4();
        let mut total_amount = Decimal::ZERO;
        let mut line_models = Vec::with_capacity(input.items.len());

        for item in &input.items {
            let product = product::Entity::find_by_id(item.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;
            if !product.is_active {
                return Err(ServiceError::InvalidOperation(format!(
                    "Product {} is not active",
                    product.id
                )));
            }

            let total_price = product.price * Decimal::from(item.quantity);
            total_amount += total_price;

            let line = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                product_name: Set(product.name.clone()),
                quantity: Set(item.quantity),
                unit_price: Set(product.price),
                total_price: Set(total_price),
                created_at: Set(Utc::now()),
            };
            line_models.push(line.insert(&txn).await?);
        }

        let active_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(Self::generate_order_number()),
            user_id: Set(input.user_id),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            customer_email: Set(input.customer_email),
            total_amount: Set(total_amount),
            currency: Set(input
                .currency
                .unwrap_or_else(|| self.default_currency.clone())),
            notes: Set(input.notes),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let order = active_model.insert(&txn).await?;

        txn.commit().await?;

        info!("Created order {} ({})", order.id, order.order_number);
        self.event_sender
            .send_or_log(Event::OrderCreated(order.id))
            .await;

        Ok((order, line_models))
    }

    /// Gets an order by ID
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: Uuid) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))
    }

    /// Gets an order by its display number
    #[instrument(skip(self))]
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<order::Model, ServiceError> {
        order::Entity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order '{}' not found", order_number)))
    }

    /// Gets an order together with its line items.
    #[instrument(skip(self))]
    pub async fn get_order_with_items(
        &self,
        id: Uuid,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let order = self.get_order(id).await?;
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok((order, items))
    }

    /// Lists orders newest-first, optionally filtered by status and user.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut query = order::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(order::Column::UserId.eq(user_id));
        }

        let query = query.order_by_desc(order::Column::CreatedAt);

        let total = query.clone().count(self.db.as_ref()).await?;
        let orders = query
            .limit(Some(limit))
            .offset(offset)
            .all(self.db.as_ref())
            .await?;
        Ok((orders, total))
    }

    /// Sets the order status. Single-field mutation without transition
    /// guards; cancellation goes through `cancel_order`.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(id).await?;
        let old_status = existing.status;

        let mut active_model: order::ActiveModel = existing.into();
        active_model.status = Set(new_status);
        let model = active_model.update(self.db.as_ref()).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: model.id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;
        Ok(model)
    }

    /// Sets the payment status.
    #[instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        id: Uuid,
        new_status: PaymentStatus,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(id).await?;

        let mut active_model: order::ActiveModel = existing.into();
        active_model.payment_status = Set(new_status);
        let model = active_model.update(self.db.as_ref()).await?;

        self.event_sender
            .send_or_log(Event::OrderPaymentStatusChanged {
                order_id: model.id,
                new_status: new_status.to_string(),
            })
            .await;
        Ok(model)
    }

    /// Cancels an order. Delivered and already-cancelled orders are refused.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: Uuid) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(id).await?;
        match existing.status {
            OrderStatus::Cancelled => {
                return Err(ServiceError::InvalidOperation(format!(
                    "Order {} is already cancelled",
                    id
                )))
            }
            OrderStatus::Delivered => {
                return Err(ServiceError::InvalidOperation(format!(
                    "Order {} has been delivered and cannot be cancelled",
                    id
                )))
            }
            _ => {}
        }

        let mut active_model: order::ActiveModel = existing.into();
        active_model.status = Set(OrderStatus::Cancelled);
        let model = active_model.update(self.db.as_ref()).await?;

        info!("Cancelled order {}", id);
        self.event_sender
            .send_or_log(Event::OrderCancelled(model.id))
            .await;
        Ok(model)
    }

    /// Order counts grouped by status; `total` is the sum over all statuses.
    #[instrument(skip(self))]
    pub async fn order_stats(&self) -> Result<OrderStats, ServiceError> {
        let mut stats = OrderStats::default();

        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let count = order::Entity::find()
                .filter(order::Column::Status.eq(status))
                .count(self.db.as_ref())
                .await?;
            match status {
                OrderStatus::Pending => stats.pending = count,
                OrderStatus::Processing => stats.processing = count,
                OrderStatus::Shipped => stats.shipped = count,
                OrderStatus::Delivered => stats.delivered = count,
                OrderStatus::Cancelled => stats.cancelled = count,
            }
            stats.total += count;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_carry_the_date_prefix() {
        let number = OrderService::generate_order_number();
        assert!(number.starts_with("ORD-"));
        assert!(number.len() <= 50);
    }

    #[test]
    fn order_numbers_are_unlikely_to_collide() {
        let a = OrderService::generate_order_number();
        let b = OrderService::generate_order_number();
        assert_ne!(a, b);
    }
}
