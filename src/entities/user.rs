use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Closed role enumeration persisted as a string.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum UserRole {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
    #[sea_orm(string_value = "merchant")]
    Merchant,
}

impl UserRole {
    /// The persisted string form of this role.
    pub fn as_value(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Admin => "admin",
            UserRole::SuperAdmin => "super_admin",
            UserRole::Merchant => "merchant",
        }
    }

    /// Parses a role from its persisted string form, case-insensitively.
    /// Unknown values fail with `InvalidInput`.
    pub fn from_value(value: &str) -> Result<Self, ServiceError> {
        match value.to_ascii_lowercase().as_str() {
            "customer" => Ok(UserRole::Customer),
            "admin" => Ok(UserRole::Admin),
            "super_admin" => Ok(UserRole::SuperAdmin),
            "merchant" => Ok(UserRole::Merchant),
            other => Err(ServiceError::InvalidInput(format!(
                "Unknown user role: {}",
                other
            ))),
        }
    }
}

/// User entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,

    /// Opaque password hash; authentication flows live outside this service
    #[serde(skip_serializing)]
    pub password_hash: String,

    #[validate(length(max = 100, message = "First name cannot exceed 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name cannot exceed 100 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 30, message = "Phone cannot exceed 30 characters"))]
    pub phone: Option<String>,

    pub role: UserRole,

    /// Soft activation flag gating the account
    pub is_active: bool,

    /// Whether the email address has been verified
    pub is_verified: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
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
            if let ActiveValue::NotSet = active_model.role {
                active_model.role = Set(UserRole::Customer);
            }
            if let ActiveValue::NotSet = active_model.is_active {
                active_model.is_active = Set(true);
            }
            if let ActiveValue::NotSet = active_model.is_verified {
                active_model.is_verified = Set(false);
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
    use assert_matches::assert_matches;
    use test_case::test_case;

    #[test_case("customer", UserRole::Customer)]
    #[test_case("admin", UserRole::Admin)]
    #[test_case("ADMIN", UserRole::Admin; "case insensitive")]
    #[test_case("super_admin", UserRole::SuperAdmin)]
    #[test_case("merchant", UserRole::Merchant)]
    fn from_value_parses_known_roles(value: &str, expected: UserRole) {
        assert_eq!(UserRole::from_value(value).unwrap(), expected);
    }

    #[test]
    fn from_value_rejects_unknown_roles() {
        let err = UserRole::from_value("bogus").unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(_));
    }

    #[test]
    fn role_round_trips_through_persisted_form() {
        for role in [
            UserRole::Customer,
            UserRole::Admin,
            UserRole::SuperAdmin,
            UserRole::Merchant,
        ] {
            assert_eq!(UserRole::from_value(role.as_value()).unwrap(), role);
        }
    }
}
