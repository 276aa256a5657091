use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of an inventory ledger entry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum MovementType {
    #[sea_orm(string_value = "In")]
    In,
    #[sea_orm(string_value = "Out")]
    Out,
    #[sea_orm(string_value = "Adjustment")]
    Adjustment,
    #[sea_orm(string_value = "Reserved")]
    Reserved,
    #[sea_orm(string_value = "Released")]
    Released,
}

/// Append-only inventory ledger row. Rows are never updated or deleted;
/// the product's stock is adjusted by `effective_quantity` at record time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: MovementType,
    /// Always positive; direction comes from the movement type
    pub quantity: i32,
    /// What caused the movement (e.g. "order", "manual")
    pub reference_type: Option<String>,
    /// Identifier of the causing record
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Inbound movements add stock.
    pub fn is_inbound(&self) -> bool {
        matches!(self.movement_type, MovementType::In | MovementType::Released)
    }

    /// Outbound movements remove stock.
    pub fn is_outbound(&self) -> bool {
        matches!(self.movement_type, MovementType::Out | MovementType::Reserved)
    }

    /// Signed quantity: negative for outbound movements, positive otherwise.
    /// `Adjustment` is neither inbound nor outbound and signs positive via
    /// the non-outbound fallthrough, matching the source system.
    pub fn effective_quantity(&self) -> i32 {
        if self.is_outbound() {
            -self.quantity
        } else {
            self.quantity
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn movement(movement_type: MovementType, quantity: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            movement_type,
            quantity,
            reference_type: None,
            reference_id: None,
            notes: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test_case(MovementType::In, 10, 10; "inbound receipt")]
    #[test_case(MovementType::Released, 4, 4; "released reservation")]
    #[test_case(MovementType::Out, 10, -10; "outbound sale")]
    #[test_case(MovementType::Reserved, 3, -3; "reservation")]
    #[test_case(MovementType::Adjustment, 7, 7; "adjustment signs positive")]
    fn effective_quantity_signs_by_direction(
        movement_type: MovementType,
        quantity: i32,
        expected: i32,
    ) {
        assert_eq!(movement(movement_type, quantity).effective_quantity(), expected);
    }

    #[test]
    fn adjustment_is_neither_inbound_nor_outbound() {
        let m = movement(MovementType::Adjustment, 1);
        assert!(!m.is_inbound());
        assert!(!m.is_outbound());
    }

    #[test]
    fn direction_predicates_partition_the_other_variants() {
        assert!(movement(MovementType::In, 1).is_inbound());
        assert!(movement(MovementType::Released, 1).is_inbound());
        assert!(movement(MovementType::Out, 1).is_outbound());
        assert!(movement(MovementType::Reserved, 1).is_outbound());
    }
}
