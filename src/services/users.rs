use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Already-hashed password; hashing happens upstream
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

/// Partial update: `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// Service for managing users
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    async fn ensure_unique_email(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }
        if query.one(self.db.as_ref()).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }
        Ok(())
    }

    /// Creates a new user
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: NewUser) -> Result<user::Model, ServiceError> {
        self.ensure_unique_email(&input.email, None).await?;

        let active_model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            password_hash: Set(input.password_hash),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            phone: Set(input.phone),
            role: input.role.map_or(NotSet, Set),
            is_active: NotSet,
            is_verified: NotSet,
            created_at: NotSet,
            updated_at: NotSet,
        };

        let model = active_model.insert(self.db.as_ref()).await?;
        info!("Created user {}", model.id);
        self.event_sender
            .send_or_log(Event::UserCreated(model.id))
            .await;
        Ok(model)
    }

    /// Gets a user by ID
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))
    }

    /// Gets a user by email
    #[instrument(skip(self))]
    pub async fn get_user_by_email(&self, email: &str) -> Result<user::Model, ServiceError> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User '{}' not found", email)))
    }

    /// Lists users, optionally filtered by role and activation state.
    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        filter: UserFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let mut query = user::Entity::find();

        if let Some(role) = filter.role {
            query = query.filter(user::Column::Role.eq(role));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(user::Column::IsActive.eq(is_active));
        }

        let query = query.order_by_asc(user::Column::Email);

        let total = query.clone().count(self.db.as_ref()).await?;
        let users = query
            .limit(Some(limit))
            .offset(offset)
            .all(self.db.as_ref())
            .await?;
        Ok((users, total))
    }

    /// Updates an existing user
    #[instrument(skip(self, patch))]
    pub async fn update_user(
        &self,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<user::Model, ServiceError> {
        let existing = self.get_user(id).await?;

        if let Some(email) = patch.email.as_deref() {
            if email != existing.email {
                self.ensure_unique_email(email, Some(id)).await?;
            }
        }

        let mut active_model: user::ActiveModel = existing.into();
        if let Some(email) = patch.email {
            active_model.email = Set(email);
        }
        if let Some(password_hash) = patch.password_hash {
            active_model.password_hash = Set(password_hash);
        }
        if let Some(first_name) = patch.first_name {
            active_model.first_name = Set(Some(first_name));
        }
        if let Some(last_name) = patch.last_name {
            active_model.last_name = Set(Some(last_name));
        }
        if let Some(phone) = patch.phone {
            active_model.phone = Set(Some(phone));
        }
        if let Some(role) = patch.role {
            active_model.role = Set(role);
        }
        if let Some(is_verified) = patch.is_verified {
            active_model.is_verified = Set(is_verified);
        }

        let model = active_model.update(self.db.as_ref()).await?;
        self.event_sender
            .send_or_log(Event::UserUpdated(model.id))
            .await;
        Ok(model)
    }

    /// Flips the activation flag. Deactivation is the soft-delete path;
    /// users are never hard-deleted.
    #[instrument(skip(self))]
    pub async fn set_user_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<user::Model, ServiceError> {
        let existing = self.get_user(id).await?;
        let mut active_model: user::ActiveModel = existing.into();
        active_model.is_active = Set(is_active);

        let model = active_model.update(self.db.as_ref()).await?;
        let event = if is_active {
            Event::UserUpdated(model.id)
        } else {
            Event::UserDeactivated(model.id)
        };
        self.event_sender.send_or_log(event).await;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tokio::sync::mpsc;

    fn service(db: DatabaseConnection) -> UserService {
        let (tx, _rx) = mpsc::channel(8);
        UserService::new(Arc::new(db), Arc::new(EventSender::new(tx)))
    }

    fn stored_user(email: &str) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            first_name: None,
            last_name: None,
            phone: None,
            role: UserRole::Customer,
            is_active: true,
            is_verified: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn create_with_registered_email_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_user("taken@example.com")]])
            .into_connection();

        let err = service(db)
            .create_user(NewUser {
                email: "taken@example.com".into(),
                password_hash: "$argon2id$stub".into(),
                first_name: None,
                last_name: None,
                phone: None,
                role: None,
            })
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Conflict(_));
    }
}
