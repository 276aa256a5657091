pub mod brands;
pub mod categories;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod users;

pub use brands::BrandService;
pub use categories::CategoryService;
pub use inventory::InventoryService;
pub use orders::OrderService;
pub use products::ProductService;
pub use users::UserService;
