use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Category entity. The tree is a flat parent-pointer list; `parent_id` null
/// means root. Ordering roots-first is done at query time, not maintained as
/// an in-memory structure.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Category name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Category name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// Arabic category name
    #[validate(length(max = 255, message = "Arabic name cannot exceed 255 characters"))]
    pub name_ar: Option<String>,

    /// URL-safe unique identifier derived from the name
    #[sea_orm(unique)]
    pub slug: String,

    /// Parent category; null for roots
    pub parent_id: Option<Uuid>,

    /// URL to the category image
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,

    /// Icon identifier for storefront rendering
    #[validate(length(max = 100, message = "Icon cannot exceed 100 characters"))]
    pub icon: Option<String>,

    /// Soft activation flag gating visibility
    pub is_active: bool,

    /// Display ordering within listings
    #[validate(range(min = 0, max = 9999, message = "Sort order must be between 0 and 9999"))]
    pub sort_order: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// True for root categories.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
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
            if let ActiveValue::NotSet = active_model.sort_order {
                active_model.sort_order = Set(0);
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

    fn category(parent_id: Option<Uuid>) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Electronics".into(),
            name_ar: None,
            slug: "electronics".into(),
            parent_id,
            image_url: None,
            icon: None,
            is_active: true,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn null_parent_is_root() {
        assert!(category(None).is_root());
        assert!(!category(Some(Uuid::new_v4())).is_root());
    }

    #[test]
    fn sort_order_out_of_range_fails_validation() {
        let mut model = category(None);
        model.sort_order = 10_000;
        assert!(model.validate().is_err());
    }

    #[test]
    fn blank_name_fails_validation() {
        let mut model = category(None);
        model.name = String::new();
        assert!(model.validate().is_err());
    }
}
