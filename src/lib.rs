pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod session;
pub mod shipment;
pub mod types;

#[cfg(test)]
pub mod testing;
