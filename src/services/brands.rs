use crate::entities::{brand, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Fields accepted when creating a brand. Unset flags fall back to the
/// entity-level defaults.
#[derive(Debug, Clone, Default)]
pub struct NewBrand {
    pub name: String,
    pub name_ar: Option<String>,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Partial update: `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct BrandPatch {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub website_url: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct BrandFilter {
    /// Substring match against name and slug
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

/// Service for managing brands
#[derive(Clone)]
pub struct BrandService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl BrandService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn ensure_unique_slug(
        &self,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = brand::Entity::find().filter(brand::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(brand::Column::Id.ne(id));
        }
        if query.one(self.db.as_ref()).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Brand slug '{}' is already in use",
                slug
            )));
        }
        Ok(())
    }

    /// Creates a new brand
    #[instrument(skip(self))]
    pub async fn create_brand(&self, input: NewBrand) -> Result<brand::Model, ServiceError> {
        self.ensure_unique_slug(&input.slug, None).await?;

        let active_model = brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            name_ar: Set(input.name_ar),
            slug: Set(input.slug),
            description: Set(input.description),
            logo_url: Set(input.logo_url),
            website_url: Set(input.website_url),
            is_active: input.is_active.map_or(NotSet, Set),
            sort_order: input.sort_order.map_or(NotSet, Set),
            created_at: NotSet,
            updated_at: NotSet,
        };

        let model = active_model.insert(self.db.as_ref()).await?;
        info!("Created brand {}", model.id);
        self.event_sender
            .send_or_log(Event::BrandCreated(model.id))
            .await;
        Ok(model)
    }

    /// Gets a brand by ID
    #[instrument(skip(self))]
    pub async fn get_brand(&self, id: Uuid) -> Result<brand::Model, ServiceError> {
        brand::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", id)))
    }

    /// Gets a brand by its slug
    #[instrument(skip(self))]
    pub async fn get_brand_by_slug(&self, slug: &str) -> Result<brand::Model, ServiceError> {
        brand::Entity::find()
            .filter(brand::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand '{}' not found", slug)))
    }

    /// Lists brands with their product counts, ordered by sort order then name.
    #[instrument(skip(self))]
    pub async fn list_brands(
        &self,
        filter: BrandFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<(brand::Model, u64)>, u64), ServiceError> {
        let mut query = brand::Entity::find();

        if let Some(is_active) = filter.is_active {
            query = query.filter(brand::Column::IsActive.eq(is_active));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query = query.filter(
                Condition::any()
                    .add(brand::Column::Name.like(&pattern))
                    .add(brand::Column::Slug.like(&pattern)),
            );
        }

        let query = query
            .order_by_asc(brand::Column::SortOrder)
            .order_by_asc(brand::Column::Name);

        let total = query.clone().count(self.db.as_ref()).await?;
        let brands = query
            .limit(Some(limit))
            .offset(offset)
            .all(self.db.as_ref())
            .await?;

        let mut rows = Vec::with_capacity(brands.len());
        for brand in brands {
            let product_count = self.count_products(brand.id).await?;
            rows.push((brand, product_count));
        }
        Ok((rows, total))
    }

    /// Number of products attached to a brand.
    #[instrument(skip(self))]
    pub async fn count_products(&self, brand_id: Uuid) -> Result<u64, ServiceError> {
        let count = product::Entity::find()
            .filter(product::Column::BrandId.eq(brand_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    /// Updates an existing brand
    #[instrument(skip(self))]
    pub async fn update_brand(
        &self,
        id: Uuid,
        patch: BrandPatch,
    ) -> Result<brand::Model, ServiceError> {
        let existing = self.get_brand(id).await?;

        if let Some(slug) = patch.slug.as_deref() {
            if slug != existing.slug {
                self.ensure_unique_slug(slug, Some(id)).await?;
            }
        }

        let mut active_model: brand::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active_model.name = Set(name);
        }
        if let Some(name_ar) = patch.name_ar {
            active_model.name_ar = Set(Some(name_ar));
        }
        if let Some(slug) = patch.slug {
            active_model.slug = Set(slug);
        }
        if let Some(description) = patch.description {
            active_model.description = Set(Some(description));
        }
        if let Some(logo_url) = patch.logo_url {
            active_model.logo_url = Set(Some(logo_url));
        }
        if let Some(website_url) = patch.website_url {
            active_model.website_url = Set(Some(website_url));
        }
        if let Some(is_active) = patch.is_active {
            active_model.is_active = Set(is_active);
        }
        if let Some(sort_order) = patch.sort_order {
            active_model.sort_order = Set(sort_order);
        }

        let model = active_model.update(self.db.as_ref()).await?;
        self.event_sender
            .send_or_log(Event::BrandUpdated(model.id))
            .await;
        Ok(model)
    }

    /// Deletes a brand. Refused while products still reference it.
    #[instrument(skip(self))]
    pub async fn delete_brand(&self, id: Uuid) -> Result<(), ServiceError> {
        let brand = self.get_brand(id).await?;

        let in_use = self.count_products(brand.id).await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "Brand {} still has {} products",
                id, in_use
            )));
        }

        brand::Entity::delete_by_id(id).exec(self.db.as_ref()).await?;
        info!("Deleted brand {}", id);
        self.event_sender.send_or_log(Event::BrandDeleted(id)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tokio::sync::mpsc;

    fn service(db: DatabaseConnection) -> BrandService {
        let (tx, _rx) = mpsc::channel(8);
        BrandService::new(Arc::new(db), Arc::new(EventSender::new(tx)))
    }

    fn stored_brand(slug: &str) -> brand::Model {
        brand::Model {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            name_ar: None,
            slug: slug.into(),
            description: None,
            logo_url: None,
            website_url: None,
            is_active: true,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn create_with_taken_slug_conflicts() {
        // The uniqueness lookup finds an existing row, so no insert happens
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_brand("acme")]])
            .into_connection();

        let err = service(db)
            .create_brand(NewBrand {
                name: "Acme".into(),
                slug: "acme".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
    }

    #[tokio::test]
    async fn update_to_taken_slug_conflicts() {
        let existing = stored_brand("acme");
        let id = existing.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing], vec![stored_brand("globex")]])
            .into_connection();

        let err = service(db)
            .update_brand(
                id,
                BrandPatch {
                    slug: Some("globex".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
    }
}
