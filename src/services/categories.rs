use crate::entities::{category, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use sea_orm::sea_query::NullOrdering;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Parent chains longer than this are treated as corrupt rather than walked
/// forever.
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name: String,
    pub name_ar: Option<String>,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Partial update: `None` leaves the field unchanged. `parent_id` uses a
/// dedicated variant so a category can be turned back into a root.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<ParentChange>,
    pub image_url: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Copy)]
pub enum ParentChange {
    /// Move under another category
    To(Uuid),
    /// Detach and make the category a root
    Root,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub parent_id: Option<Uuid>,
}

/// Flat category listing with the derived tree counts. `total_count` always
/// equals `categories.len()`; parent and child counts partition it.
#[derive(Debug, Clone)]
pub struct CategoryTree {
    pub categories: Vec<category::Model>,
    pub total_count: usize,
    pub active_count: usize,
    pub parent_count: usize,
    pub child_count: usize,
}

/// Service for managing categories
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn ensure_unique_slug(
        &self,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = category::Entity::find().filter(category::Column::Slug.eq(slug));
        if let Some(id) = exclude {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.one(self.db.as_ref()).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category slug '{}' is already in use",
                slug
            )));
        }
        Ok(())
    }

    /// Walks the ancestor chain from `new_parent_id` upward and rejects the
    /// move if `category_id` appears on it. Also verifies every ancestor
    /// actually exists.
    async fn ensure_no_cycle(
        &self,
        category_id: Uuid,
        new_parent_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mut cursor = Some(new_parent_id);
        let mut depth = 0usize;

        while let Some(current) = cursor {
            if current == category_id {
                return Err(ServiceError::InvalidOperation(
                    "Category cannot become its own ancestor".to_string(),
                ));
            }
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                return Err(ServiceError::InvalidOperation(format!(
                    "Category ancestry exceeds {} levels",
                    MAX_TREE_DEPTH
                )));
            }

            let parent = category::Entity::find_by_id(current)
                .one(self.db.as_ref())
                .await?
                .ok_or_else(|| {
                    ServiceError::InvalidInput(format!("Parent category {} not found", current))
                })?;
            cursor = parent.parent_id;
        }

        Ok(())
    }

    /// Creates a new category
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: NewCategory,
    ) -> Result<category::Model, ServiceError> {
        self.ensure_unique_slug(&input.slug, None).await?;

        let id = Uuid::new_v4();
        if let Some(parent_id) = input.parent_id {
            self.ensure_no_cycle(id, parent_id).await?;
        }

        let active_model = category::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            name_ar: Set(input.name_ar),
            slug: Set(input.slug),
            parent_id: Set(input.parent_id),
            image_url: Set(input.image_url),
            icon: Set(input.icon),
            is_active: input.is_active.map_or(NotSet, Set),
            sort_order: input.sort_order.map_or(NotSet, Set),
            created_at: NotSet,
            updated_at: NotSet,
        };

        let model = active_model.insert(self.db.as_ref()).await?;
        info!("Created category {}", model.id);
        self.event_sender
            .send_or_log(Event::CategoryCreated(model.id))
            .await;
        Ok(model)
    }

    /// Gets a category by ID
    #[instrument(skip(self))]
    pub async fn get_category(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))
    }

    /// Gets a category by its slug
    #[instrument(skip(self))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<category::Model, ServiceError> {
        category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category '{}' not found", slug)))
    }

    /// Lists categories with their product counts.
    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        filter: CategoryFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<(category::Model, u64)>, u64), ServiceError> {
        let mut query = category::Entity::find();

        if let Some(is_active) = filter.is_active {
            query = query.filter(category::Column::IsActive.eq(is_active));
        }
        if let Some(parent_id) = filter.parent_id {
            query = query.filter(category::Column::ParentId.eq(parent_id));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query = query.filter(
                Condition::any()
                    .add(category::Column::Name.like(&pattern))
                    .add(category::Column::Slug.like(&pattern)),
            );
        }

        let query = query
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name);

        let total = query.clone().count(self.db.as_ref()).await?;
        let categories = query
            .limit(Some(limit))
            .offset(offset)
            .all(self.db.as_ref())
            .await?;

        let mut rows = Vec::with_capacity(categories.len());
        for category in categories {
            let product_count = self.count_products(category.id).await?;
            rows.push((category, product_count));
        }
        Ok((rows, total))
    }

    /// Full category listing sorted roots-first, with the derived counts.
    #[instrument(skip(self))]
    pub async fn category_tree(&self) -> Result<CategoryTree, ServiceError> {
        let categories = category::Entity::find()
            .order_by_with_nulls(category::Column::ParentId, Order::Asc, NullOrdering::First)
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await?;

        Ok(build_tree(categories))
    }

    /// Number of products attached to a category.
    #[instrument(skip(self))]
    pub async fn count_products(&self, category_id: Uuid) -> Result<u64, ServiceError> {
        let count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    /// Updates an existing category
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: Uuid,
        patch: CategoryPatch,
    ) -> Result<category::Model, ServiceError> {
        let existing = self.get_category(id).await?;

        if let Some(slug) = patch.slug.as_deref() {
            if slug != existing.slug {
                self.ensure_unique_slug(slug, Some(id)).await?;
            }
        }
        if let Some(ParentChange::To(parent_id)) = patch.parent_id {
            if existing.parent_id != Some(parent_id) {
                self.ensure_no_cycle(id, parent_id).await?;
            }
        }

        let mut active_model: category::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active_model.name = Set(name);
        }
        if let Some(name_ar) = patch.name_ar {
            active_model.name_ar = Set(Some(name_ar));
        }
        if let Some(slug) = patch.slug {
            active_model.slug = Set(slug);
        }
        match patch.parent_id {
            Some(ParentChange::To(parent_id)) => active_model.parent_id = Set(Some(parent_id)),
            Some(ParentChange::Root) => active_model.parent_id = Set(None),
            None => {}
        }
        if let Some(image_url) = patch.image_url {
            active_model.image_url = Set(Some(image_url));
        }
        if let Some(icon) = patch.icon {
            active_model.icon = Set(Some(icon));
        }
        if let Some(is_active) = patch.is_active {
            active_model.is_active = Set(is_active);
        }
        if let Some(sort_order) = patch.sort_order {
            active_model.sort_order = Set(sort_order);
        }

        let model = active_model.update(self.db.as_ref()).await?;
        self.event_sender
            .send_or_log(Event::CategoryUpdated(model.id))
            .await;
        Ok(model)
    }

    /// Deletes a category. Refused while child categories or products still
    /// reference it.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let category = self.get_category(id).await?;

        let children = category::Entity::find()
            .filter(category::Column::ParentId.eq(category.id))
            .count(self.db.as_ref())
            .await?;
        if children > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category {} still has {} child categories",
                id, children
            )));
        }

        let in_use = self.count_products(category.id).await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category {} still has {} products",
                id, in_use
            )));
        }

        category::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;
        info!("Deleted category {}", id);
        self.event_sender
            .send_or_log(Event::CategoryDeleted(id))
            .await;
        Ok(())
    }
}

fn build_tree(categories: Vec<category::Model>) -> CategoryTree {
    let total_count = categories.len();
    let active_count = categories.iter().filter(|c| c.is_active).count();
    let parent_count = categories.iter().filter(|c| c.is_root()).count();
    let child_count = total_count - parent_count;

    CategoryTree {
        categories,
        total_count,
        active_count,
        parent_count,
        child_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tokio::sync::mpsc;

    fn service(db: DatabaseConnection) -> CategoryService {
        let (tx, _rx) = mpsc::channel(8);
        CategoryService::new(Arc::new(db), Arc::new(EventSender::new(tx)))
    }

    fn cat(parent_id: Option<Uuid>, is_active: bool) -> category::Model {
        category::Model {
            id: Uuid::new_v4(),
            name: "Electronics".into(),
            name_ar: None,
            slug: format!("cat-{}", Uuid::new_v4()),
            parent_id,
            image_url: None,
            icon: None,
            is_active,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn tree_counts_partition_the_listing() {
        let root = cat(None, true);
        let rows = vec![
            root.clone(),
            cat(Some(root.id), true),
            cat(Some(root.id), false),
            cat(None, false),
        ];

        let tree = build_tree(rows);
        assert_eq!(tree.total_count, tree.categories.len());
        assert_eq!(tree.parent_count + tree.child_count, tree.total_count);
        assert_eq!(tree.parent_count, 2);
        assert_eq!(tree.child_count, 2);
        assert_eq!(tree.active_count, 2);
        assert!(tree.active_count <= tree.total_count);
    }

    #[test]
    fn empty_tree_has_zero_counts() {
        let tree = build_tree(vec![]);
        assert_eq!(tree.total_count, 0);
        assert_eq!(tree.parent_count, 0);
        assert_eq!(tree.child_count, 0);
        assert_eq!(tree.active_count, 0);
    }

    #[tokio::test]
    async fn reparenting_onto_itself_is_rejected() {
        let target = cat(None, true);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![target.clone()]])
            .into_connection();

        let err = service(db)
            .update_category(
                target.id,
                CategoryPatch {
                    parent_id: Some(ParentChange::To(target.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidOperation(_));
    }

    #[tokio::test]
    async fn reparenting_onto_a_descendant_is_rejected() {
        let root = cat(None, true);
        let child = cat(Some(root.id), true);

        // One lookup for the category being moved, one per ancestor walked
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![root.clone()], vec![child.clone()]])
            .into_connection();

        let err = service(db)
            .update_category(
                root.id,
                CategoryPatch {
                    parent_id: Some(ParentChange::To(child.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidOperation(_));
    }

    #[tokio::test]
    async fn create_with_taken_slug_conflicts() {
        let existing = cat(None, true);
        let slug = existing.slug.clone();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing]])
            .into_connection();

        let err = service(db)
            .create_category(NewCategory {
                name: "Electronics".into(),
                slug,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
    }
}
