use crate::entities::inventory_movement::{self, MovementType};
use crate::entities::product;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
}

/// Service for the append-only inventory movement ledger. Recording a
/// movement and applying its effective quantity to the product's stock happen
/// in one transaction.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Records a movement and adjusts the product's stock by the movement's
    /// effective quantity when the product tracks inventory.
    #[instrument(skip(self))]
    pub async fn record_movement(
        &self,
        input: NewMovement,
    ) -> Result<inventory_movement::Model, ServiceError> {
        if input.quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "Movement quantity must be greater than zero".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let product = product::Entity::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let active_model = inventory_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            movement_type: Set(input.movement_type),
            quantity: Set(input.quantity),
            reference_type: Set(input.reference_type),
            reference_id: Set(input.reference_id),
            notes: Set(input.notes),
            created_by: Set(input.created_by),
            created_at: Set(Utc::now()),
        };
        let movement = active_model.insert(&txn).await?;

        let effective = movement.effective_quantity();
        if product.track_inventory {
            let stock = product.stock_quantity;
            let mut product_model: product::ActiveModel = product.into();
            product_model.stock_quantity = Set(stock + effective);
            product_model.update(&txn).await?;
        }

        txn.commit().await?;

        info!(
            "Recorded {} movement {} for product {} ({:+})",
            movement.movement_type, movement.id, movement.product_id, effective
        );
        self.event_sender
            .send_or_log(Event::InventoryMovementRecorded {
                movement_id: movement.id,
                product_id: movement.product_id,
                movement_type: movement.movement_type.to_string(),
                effective_quantity: effective,
            })
            .await;

        Ok(movement)
    }

    /// Gets a single ledger row by ID
    #[instrument(skip(self))]
    pub async fn get_movement(&self, id: Uuid) -> Result<inventory_movement::Model, ServiceError> {
        inventory_movement::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory movement {} not found", id)))
    }

    /// Lists ledger rows newest-first, optionally filtered by product and
    /// movement type.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        filter: MovementFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<inventory_movement::Model>, u64), ServiceError> {
        let mut query = inventory_movement::Entity::find();

        if let Some(product_id) = filter.product_id {
            query = query.filter(inventory_movement::Column::ProductId.eq(product_id));
        }
        if let Some(movement_type) = filter.movement_type {
            query = query.filter(inventory_movement::Column::MovementType.eq(movement_type));
        }

        let query = query.order_by_desc(inventory_movement::Column::CreatedAt);

        let total = query.clone().count(self.db.as_ref()).await?;
        let movements = query
            .limit(Some(limit))
            .offset(offset)
            .all(self.db.as_ref())
            .await?;
        Ok((movements, total))
    }

    /// Ledger history for one product, newest-first.
    #[instrument(skip(self))]
    pub async fn product_movements(
        &self,
        product_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<inventory_movement::Model>, u64), ServiceError> {
        // 404 for products that never existed rather than an empty page
        product::Entity::find_by_id(product_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        self.list_movements(
            MovementFilter {
                product_id: Some(product_id),
                movement_type: None,
            },
            limit,
            offset,
        )
        .await
    }
}
