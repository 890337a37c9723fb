//! Domain models for the order store.
//!
//! These types represent validated domain objects, separate from the
//! database row types kept private inside each repository.

pub mod address;
pub mod order;
pub mod product;
pub mod role;
pub mod user;

pub use address::{Address, AddressFields};
pub use order::{AddressAssignment, CreatedOrder, NewOrderItem, Order, OrderItem, ProductSummary};
pub use product::Product;
pub use role::Role;
pub use user::User;
