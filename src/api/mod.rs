pub mod auth;
pub mod orders;
pub mod shipments;

pub use auth::{AuthApi, AuthGateway, LoginPayload};
pub use orders::{OrderApi, OrderQuery};
pub use shipments::{ShipmentApi, ShipmentError};
