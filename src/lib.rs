//! Souq API library
//!
//! Multi-store commerce backend: catalog (brands, categories, products),
//! an append-only inventory ledger, orders with immutable line snapshots,
//! and user accounts. Handlers are thin; domain rules live in the service
//! layer and persistence goes through SeaORM entities.

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod rate_limiter;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::handlers::AppServices;

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: AppConfig,
        event_sender: Arc<EventSender>,
    ) -> Self {
        let services = AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Versioned API router. Mounted under `/api/v1` by the binary.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/brands", handlers::brands::brand_routes())
        .nest("/categories", handlers::categories::category_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/inventory", handlers::inventory::inventory_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/users", handlers::users::user_routes())
}

/// Root-level routes: a bare liveness probe that needs no state lookups.
pub fn root_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(|| async { "Souq API" }))
}
