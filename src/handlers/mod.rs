pub mod brands;
pub mod categories;
pub mod common;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod users;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{
    BrandService, CategoryService, InventoryService, OrderService, ProductService, UserService,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Bundle of domain services shared through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub brands: BrandService,
    pub categories: CategoryService,
    pub products: ProductService,
    pub inventory: InventoryService,
    pub orders: OrderService,
    pub users: UserService,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        Self {
            brands: BrandService::new(db.clone(), event_sender.clone()),
            categories: CategoryService::new(db.clone(), event_sender.clone()),
            products: ProductService::new(
                db.clone(),
                event_sender.clone(),
                config.default_currency.clone(),
            ),
            inventory: InventoryService::new(db.clone(), event_sender.clone()),
            orders: OrderService::new(
                db.clone(),
                event_sender.clone(),
                config.default_currency.clone(),
            ),
            users: UserService::new(db, event_sender),
        }
    }
}
