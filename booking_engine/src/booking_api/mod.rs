//! # Booking engine public API
//!
//! The API is split by concern, and each part only asks for the storage traits it needs:
//!
//! * [`order_flow_api`] takes bookings, answers schedule queries, and applies gateway notifications and admin status
//!   changes to orders.
//! * [`payment_api`] opens gateway payment pages for the deposit and the balance, after checking that the leg may be
//!   paid.
//! * [`catalog_api`] reads and manages the package catalog.
//! * [`accounts_api`] registers and logs in users, and manages roles.
//!
//! # API usage
//!
//! An API instance is created by handing it a backend that implements the required traits:
//!
//! ```rust,ignore
//! use booking_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/booking.db", 25).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let booked = api.check_schedule("2024-12-20").await?;
//! ```
pub mod accounts_api;
pub mod catalog_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_api;
