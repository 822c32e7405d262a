//! # Booking engine
//!
//! The core of the wedding-decoration booking service. It is independent of the HTTP layer and of any particular
//! payment gateway.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@db`]). The storage contracts are defined as traits, with SQLite as the supported backend. The
//!    data types stored are in [`db_types`] and are public.
//! 2. The lifecycle rules ([`order_lifecycle`]): the deposit split, the merchant order id format, and the order status
//!    transitions. These are pure functions.
//! 3. The public API ([`mod@booking_api`]), which ties the rules to storage.
//!
//! The engine also publishes [`events`] when orders are created or change status, so that other components can react
//! to them.
mod booking_api;
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod order_lifecycle;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use booking_api::{
    accounts_api::AccountApi,
    catalog_api::CatalogApi,
    errors::{AccountApiError, CatalogApiError, GatewayError, OrderFlowError, PaymentApiError, PaymentGuardError},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_api::{check_payable, Payer, PaymentApi, PaymentProvider, PaymentRequest, PaymentSession},
};

pub mod traits {
    pub use crate::db::traits::*;
}
