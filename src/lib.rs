//! Persistence layer for a car wash: customers, the service catalog and bookings,
//! kept in an embedded SQLite database.

pub mod db;
pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use error::{Result, StoreError};
pub use models::{BookingDetails, Customer, Service};
pub use store::BookingStore;
