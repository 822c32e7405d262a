//! # Decoration booking server
//! The HTTP front end of the booking service. It is responsible for:
//! * Accounts and sessions (HS256 tokens in the `auth-token` cookie).
//! * Serving the package catalog, and letting admins maintain it.
//! * Taking bookings, which reserve the requested date.
//! * Opening Midtrans payment pages for the deposit and the balance of a booking.
//! * Receiving Midtrans payment notifications and passing them to the order flow.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! `/health` returns a 200 OK response. Everything else lives under `/api`; see [routes](routes/index.html).
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod seed;
pub mod server;
