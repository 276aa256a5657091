use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Product entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Product name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// Arabic product name
    #[validate(length(max = 255, message = "Arabic name cannot exceed 255 characters"))]
    pub name_ar: Option<String>,

    /// SKU (Stock Keeping Unit)
    #[sea_orm(unique)]
    #[validate(length(
        min = 1,
        max = 100,
        message = "SKU must be between 1 and 100 characters"
    ))]
    pub sku: String,

    /// URL-safe unique identifier derived from the name
    #[sea_orm(unique)]
    pub slug: String,

    /// Product description
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,

    /// Category this product belongs to
    pub category_id: Option<Uuid>,

    /// Brand this product belongs to
    pub brand_id: Option<Uuid>,

    /// Selling price
    pub price: Decimal,

    /// Currency for the price (e.g. USD, SAR)
    #[validate(length(min = 3, max = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,

    /// On-hand quantity, adjusted by inventory movements
    pub stock_quantity: i32,

    /// Threshold at or below which the product counts as low stock
    pub min_stock_level: i32,

    /// Whether inventory movements affect this product's stock
    pub track_inventory: bool,

    /// URL to the primary product image
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    /// Soft activation flag gating visibility
    pub is_active: bool,

    /// Featured flag for storefront placement
    pub is_featured: bool,

    /// Display ordering within listings
    #[validate(range(min = 0, max = 9999, message = "Sort order must be between 0 and 9999"))]
    pub sort_order: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Low stock: tracked and at or below the configured threshold.
    pub fn is_low_stock(&self) -> bool {
        self.track_inventory && self.stock_quantity <= self.min_stock_level
    }

    /// Out of stock: tracked and nothing on hand.
    pub fn is_out_of_stock(&self) -> bool {
        self.track_inventory && self.stock_quantity <= 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id"
    )]
    Brand,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::inventory_movement::Entity")]
    InventoryMovements,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::inventory_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryMovements.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.is_active {
                active_model.is_active = Set(true);
            }
            if let ActiveValue::NotSet = active_model.is_featured {
                active_model.is_featured = Set(false);
            }
            if let ActiveValue::NotSet = active_model.track_inventory {
                active_model.track_inventory = Set(true);
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        let model: Model = active_model.clone().try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(stock: i32, min_level: i32, tracked: bool) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Test product".into(),
            name_ar: None,
            sku: "SKU-001".into(),
            slug: "test-product".into(),
            description: None,
            category_id: None,
            brand_id: None,
            price: dec!(19.99),
            currency: "USD".into(),
            stock_quantity: stock,
            min_stock_level: min_level,
            track_inventory: tracked,
            image_url: None,
            is_active: true,
            is_featured: false,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn low_stock_at_threshold() {
        assert!(product(5, 5, true).is_low_stock());
        assert!(product(4, 5, true).is_low_stock());
        assert!(!product(6, 5, true).is_low_stock());
    }

    #[test]
    fn untracked_products_never_report_stock_states() {
        assert!(!product(0, 5, false).is_low_stock());
        assert!(!product(0, 5, false).is_out_of_stock());
    }

    #[test]
    fn out_of_stock_at_zero_or_below() {
        assert!(product(0, 5, true).is_out_of_stock());
        assert!(product(-2, 5, true).is_out_of_stock());
        assert!(!product(1, 5, true).is_out_of_stock());
    }
}
