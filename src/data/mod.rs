//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Store traits consumed by the auth and API layers

mod database;
mod models;
mod store;

pub use database::Database;
pub use models::*;
pub use store::{MeasurementStore, SessionStore};

#[cfg(test)]
pub use store::MockSessionStore;
