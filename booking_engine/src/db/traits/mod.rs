//! # Storage contracts
//!
//! The traits in this module define what a storage backend must provide for the booking engine to run on top of it.
//! The public APIs in [`crate::booking_api`] are generic over these traits, so that the HTTP layer can be tested
//! against mocks and the engine can be tested against a real database.
//!
//! * [`BookingDatabase`] stores orders and the schedule of reserved dates. It is responsible for making a booking
//!   atomic, and for the conditional updates that keep payment notifications from racing each other.
//! * [`CatalogManagement`] stores the package catalog.
//! * [`AccountManagement`] stores user accounts.
mod account_management;
mod booking_database;
mod catalog_management;

pub use account_management::{AccountManagement, AccountManagementError};
pub use booking_database::{BookingDatabase, BookingDatabaseError};
pub use catalog_management::{CatalogError, CatalogManagement};
