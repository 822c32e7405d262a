//! A thin client for the Midtrans Snap API.
//!
//! Only the calls the booking server needs are covered: creating a Snap transaction, and verifying the signature on
//! the HTTP notifications Midtrans sends back once the customer has paid (or failed to).
mod api;
mod config;
mod error;

mod data_objects;
pub mod helpers;

pub use api::MidtransApi;
pub use config::MidtransConfig;
pub use data_objects::{CustomerDetails, ItemDetails, MidtransNotification, SnapTransaction, SnapTransactionRequest, TransactionDetails};
pub use error::MidtransApiError;
