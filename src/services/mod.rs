//! Typed wrappers over backend endpoints

pub mod order;

pub use order::{NewOrder, OrderLine, OrderService, OrderStatus, OrderStatusUpdate, ProductRef};
