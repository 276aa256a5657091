use crate::entities::{inventory_movement, order_item, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub name_ar: Option<String>,
    pub sku: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub price: Decimal,
    pub currency: Option<String>,
    pub stock_quantity: Option<i32>,
    pub min_stock_level: Option<i32>,
    pub track_inventory: Option<bool>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Partial update: `None` leaves the field unchanged. Stock is deliberately
/// absent; it only moves through the inventory ledger.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub sku: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub min_stock_level: Option<i32>,
    pub track_inventory: Option<bool>,
    pub image_url: Option<String>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Substring match against name, slug, and SKU
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Service for managing products
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_currency: String,
}

impl ProductService {
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

    async fn ensure_unique_slug(
        &self,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = product::Entity::find().filter(product::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(product::Column::Id.ne(id));
        }
        if query.one(self.db.as_ref()).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product slug '{}' is already in use",
                slug
            )));
        }
        Ok(())
    }

    async fn ensure_unique_sku(
        &self,
        sku: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = product::Entity::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = exclude {
            query = query.filter(product::Column::Id.ne(id));
        }
        if query.one(self.db.as_ref()).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "SKU '{}' is already in use",
                sku
            )));
        }
        Ok(())
    }

    fn ensure_non_negative_price(price: Decimal) -> Result<(), ServiceError> {
        if price < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Price cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Creates a new product
    #[instrument(skip(self))]
    pub async fn create_product(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        Self::ensure_non_negative_price(input.price)?;
        self.ensure_unique_sku(&input.sku, None).await?;
        self.ensure_unique_slug(&input.slug, None).await?;

        let currency = input
            .currency
            .unwrap_or_else(|| self.default_currency.clone());

        let active_model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            name_ar: Set(input.name_ar),
            sku: Set(input.sku),
            slug: Set(input.slug),
            description: Set(input.description),
            category_id: Set(input.category_id),
            brand_id: Set(input.brand_id),
            price: Set(input.price),
            currency: Set(currency),
            stock_quantity: Set(input.stock_quantity.unwrap_or(0)),
            min_stock_level: Set(input.min_stock_level.unwrap_or(0)),
            track_inventory: input.track_inventory.map_or(NotSet, Set),
            image_url: Set(input.image_url),
            is_active: input.is_active.map_or(NotSet, Set),
            is_featured: input.is_featured.map_or(NotSet, Set),
            sort_order: input.sort_order.map_or(NotSet, Set),
            created_at: NotSet,
            updated_at: NotSet,
        };

        let model = active_model.insert(self.db.as_ref()).await?;
        info!("Created product {} ({})", model.id, model.sku);
        self.event_sender
            .send_or_log(Event::ProductCreated(model.id))
            .await;
        Ok(model)
    }

    /// Gets a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    /// Gets a product by its slug
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<product::Model, ServiceError> {
        product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))
    }

    /// Gets a product by its SKU
    #[instrument(skip(self))]
    pub async fn get_product_by_sku(&self, sku: &str) -> Result<product::Model, ServiceError> {
        product::Entity::find()
            .filter(product::Column::Sku.eq(sku))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with SKU '{}' not found", sku)))
    }

    /// Lists products matching the filter, ordered by sort order then name.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = product::Entity::find();

        if let Some(is_active) = filter.is_active {
            query = query.filter(product::Column::IsActive.eq(is_active));
        }
        if let Some(is_featured) = filter.is_featured {
            query = query.filter(product::Column::IsFeatured.eq(is_featured));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(brand_id) = filter.brand_id {
            query = query.filter(product::Column::BrandId.eq(brand_id));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query = query.filter(
                Condition::any()
                    .add(product::Column::Name.like(&pattern))
                    .add(product::Column::Slug.like(&pattern))
                    .add(product::Column::Sku.like(&pattern)),
            );
        }

        let query = query
            .order_by_asc(product::Column::SortOrder)
            .order_by_asc(product::Column::Name);

        let total = query.clone().count(self.db.as_ref()).await?;
        let products = query
            .limit(Some(limit))
            .offset(offset)
            .all(self.db.as_ref())
            .await?;
        Ok((products, total))
    }

    /// Tracked products at or below their minimum stock level.
    #[instrument(skip(self))]
    pub async fn list_low_stock(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::TrackInventory.eq(true))
            .filter(
                Expr::col(product::Column::StockQuantity)
                    .lte(Expr::col(product::Column::MinStockLevel)),
            )
            .order_by_asc(product::Column::StockQuantity)
            .all(self.db.as_ref())
            .await?;
        Ok(products)
    }

    /// Tracked products with nothing on hand.
    #[instrument(skip(self))]
    pub async fn list_out_of_stock(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::TrackInventory.eq(true))
            .filter(product::Column::StockQuantity.lte(0))
            .order_by_asc(product::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok(products)
    }

    /// Active products flagged for storefront placement.
    #[instrument(skip(self))]
    pub async fn list_featured(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::IsFeatured.eq(true))
            .filter(product::Column::IsActive.eq(true))
            .order_by_asc(product::Column::SortOrder)
            .all(self.db.as_ref())
            .await?;
        Ok(products)
    }

    /// Updates an existing product
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: Uuid,
        patch: ProductPatch,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;

        if let Some(price) = patch.price {
            Self::ensure_non_negative_price(price)?;
        }
        if let Some(sku) = patch.sku.as_deref() {
            if sku != existing.sku {
                self.ensure_unique_sku(sku, Some(id)).await?;
            }
        }
        if let Some(slug) = patch.slug.as_deref() {
            if slug != existing.slug {
                self.ensure_unique_slug(slug, Some(id)).await?;
            }
        }

        let mut active_model: product::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active_model.name = Set(name);
        }
        if let Some(name_ar) = patch.name_ar {
            active_model.name_ar = Set(Some(name_ar));
        }
        if let Some(sku) = patch.sku {
            active_model.sku = Set(sku);
        }
        if let Some(slug) = patch.slug {
            active_model.slug = Set(slug);
        }
        if let Some(description) = patch.description {
            active_model.description = Set(Some(description));
        }
        if let Some(category_id) = patch.category_id {
            active_model.category_id = Set(Some(category_id));
        }
        if let Some(brand_id) = patch.brand_id {
            active_model.brand_id = Set(Some(brand_id));
        }
        if let Some(price) = patch.price {
            active_model.price = Set(price);
        }
        if let Some(currency) = patch.currency {
            active_model.currency = Set(currency);
        }
        if let Some(min_stock_level) = patch.min_stock_level {
            active_model.min_stock_level = Set(min_stock_level);
        }
        if let Some(track_inventory) = patch.track_inventory {
            active_model.track_inventory = Set(track_inventory);
        }
        if let Some(image_url) = patch.image_url {
            active_model.image_url = Set(Some(image_url));
        }
        if let Some(is_featured) = patch.is_featured {
            active_model.is_featured = Set(is_featured);
        }
        if let Some(sort_order) = patch.sort_order {
            active_model.sort_order = Set(sort_order);
        }

        let model = active_model.update(self.db.as_ref()).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(model.id))
            .await;
        Ok(model)
    }

    /// Flips the activation flag.
    #[instrument(skip(self))]
    pub async fn set_product_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;
        let mut active_model: product::ActiveModel = existing.into();
        active_model.is_active = Set(is_active);

        let model = active_model.update(self.db.as_ref()).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(model.id))
            .await;
        Ok(model)
    }

    /// Deletes a product. Refused while order lines or ledger rows still
    /// reference it, so order history and the movement ledger stay intact.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let product = self.get_product(id).await?;

        let ordered = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(product.id))
            .count(self.db.as_ref())
            .await?;
        if ordered > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} appears on {} order lines",
                id, ordered
            )));
        }

        let movements = inventory_movement::Entity::find()
            .filter(inventory_movement::Column::ProductId.eq(product.id))
            .count(self.db.as_ref())
            .await?;
        if movements > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} has {} inventory movements",
                id, movements
            )));
        }

        product::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        info!("Deleted product {}", id);
        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tokio::sync::mpsc;

    fn service(db: DatabaseConnection) -> ProductService {
        let (tx, _rx) = mpsc::channel(8);
        ProductService::new(Arc::new(db), Arc::new(EventSender::new(tx)), "USD".into())
    }

    fn stored_product(sku: &str, slug: &str) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            name: "Kettle".into(),
            name_ar: None,
            sku: sku.into(),
            slug: slug.into(),
            description: None,
            category_id: None,
            brand_id: None,
            price: dec!(49.00),
            currency: "USD".into(),
            stock_quantity: 0,
            min_stock_level: 0,
            track_inventory: true,
            image_url: None,
            is_active: true,
            is_featured: false,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn new_product(sku: &str, slug: &str) -> NewProduct {
        NewProduct {
            name: "Kettle".into(),
            sku: sku.into(),
            slug: slug.into(),
            price: dec!(49.00),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_with_taken_sku_conflicts() {
        // The SKU lookup comes first and finds a row, so no insert happens
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_product("KTL-001", "other-kettle")]])
            .into_connection();

        let err = service(db)
            .create_product(new_product("KTL-001", "kettle"))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
    }

    #[tokio::test]
    async fn create_with_taken_slug_conflicts() {
        // SKU is free; the slug lookup finds a row
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                Vec::<product::Model>::new(),
                vec![stored_product("OTHER-1", "kettle")],
            ])
            .into_connection();

        let err = service(db)
            .create_product(new_product("KTL-001", "kettle"))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
    }

    #[tokio::test]
    async fn negative_price_is_rejected_before_any_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let mut input = new_product("KTL-001", "kettle");
        input.price = dec!(-1.00);
        let err = service(db).create_product(input).await.unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(_));
    }
}
