use crate::config::AppConfig;
use crate::errors::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// URL-safe slug: lowercase alphanumerics separated by single hyphens.
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex is valid"));

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().map_err(ServiceError::from)
}

/// Custom validator for slug fields.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message =
            Some("Slug must be lowercase alphanumerics separated by single hyphens".into());
        Err(err)
    }
}

/// Pagination parameters for list operations
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size; omitted or 0 means the configured default, larger values
    /// are clamped to the configured maximum
    #[serde(default)]
    pub per_page: u32,
}

fn default_page() -> u64 {
    1
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: 0,
        }
    }
}

impl PaginationParams {
    /// Resolves the requested page against the configured bounds, returning
    /// `(limit, offset)` for the service layer.
    pub fn limit_offset(&self, config: &AppConfig) -> (u64, u64) {
        let limit = u64::from(config.clamp_page_size(self.per_page));
        let offset = self.page.saturating_sub(1) * limit;
        (limit, offset)
    }
}

/// Standard paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn config() -> AppConfig {
        // Deserializing an empty map exercises the same defaults load_config uses
        let cfg = config::Config::builder()
            .set_default("database_url", "sqlite::memory:")
            .unwrap()
            .build()
            .unwrap();
        cfg.try_deserialize().unwrap()
    }

    #[test]
    fn default_pagination_uses_configured_page_size() {
        let params = PaginationParams::default();
        let (limit, offset) = params.limit_offset(&config());
        assert_eq!(limit, 20);
        assert_eq!(offset, 0);
    }

    #[test]
    fn oversized_per_page_is_clamped() {
        let params = PaginationParams {
            page: 3,
            per_page: 5000,
        };
        let (limit, offset) = params.limit_offset(&config());
        assert_eq!(limit, 100);
        assert_eq!(offset, 200);
    }

    #[test_case(0, 20, 0; "empty listing")]
    #[test_case(1, 20, 1; "single partial page")]
    #[test_case(20, 20, 1; "exact page boundary")]
    #[test_case(21, 20, 2; "one past the boundary")]
    fn total_pages_rounds_up(total: u64, limit: u64, expected: u64) {
        let response: PaginatedResponse<String> = PaginatedResponse::new(vec![], total, 1, limit);
        assert_eq!(response.total_pages, expected);
    }

    #[test_case("electronics"; "single word")]
    #[test_case("mens-watches"; "hyphenated")]
    #[test_case("tv-4k-2026"; "digits")]
    fn valid_slugs_pass(slug: &str) {
        assert!(validate_slug(slug).is_ok());
    }

    #[test_case(""; "empty")]
    #[test_case("Electronics"; "uppercase")]
    #[test_case("mens--watches"; "double hyphen")]
    #[test_case("-leading"; "leading hyphen")]
    #[test_case("trailing-"; "trailing hyphen")]
    #[test_case("caf\u{e9}"; "non ascii")]
    fn invalid_slugs_fail(slug: &str) {
        assert!(validate_slug(slug).is_err());
    }
}
