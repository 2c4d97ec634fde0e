//! CLI command implementations

pub mod cache;
pub mod config;
pub mod stock;

pub use cache::execute as cache;
pub use config::execute as config;
pub use stock::execute as stock;
