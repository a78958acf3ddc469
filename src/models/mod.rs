pub mod order;
pub mod user;

pub use order::{CourierId, Order, OrderStatus, Shipment, ShippingInfo};
pub use user::{CrudPermission, Permission, Role, User};
