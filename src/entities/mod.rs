pub mod brand;
pub mod category;
pub mod inventory_movement;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

pub use brand::Entity as Brand;
pub use category::Entity as Category;
pub use inventory_movement::Entity as InventoryMovement;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
pub use user::Entity as User;
