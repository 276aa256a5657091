use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Brand entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "brands")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Brand name
    #[validate(length(
        min = 1,
        max = 255,
        message = "Brand name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// Arabic brand name
    #[validate(length(max = 255, message = "Arabic name cannot exceed 255 characters"))]
    pub name_ar: Option<String>,

    /// URL-safe unique identifier derived from the name
    #[sea_orm(unique)]
    pub slug: String,

    /// Brand description
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,

    /// URL to the brand logo
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,

    /// Brand website
    #[validate(url(message = "Website URL must be a valid URL"))]
    pub website_url: Option<String>,

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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
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
