use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    db::traits::{AccountManagementError, BookingDatabaseError, CatalogError},
    db_types::{OrderId, PackageId},
    helpers::PasswordError,
    order_lifecycle::{MalformedOrderId, TransitionError},
};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid input. {0}")]
    InvalidInput(String),
    #[error("An account for {0} already exists")]
    EmailTaken(String),
    /// Deliberately the same for an unknown email and a wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Could not process the password. {0}")]
    PasswordError(#[from] PasswordError),
}

impl From<AccountManagementError> for AccountApiError {
    fn from(e: AccountManagementError) -> Self {
        match e {
            AccountManagementError::DuplicateEmail(email) => Self::EmailTaken(email),
            AccountManagementError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid input. {0}")]
    InvalidInput(String),
    #[error("Package {0} does not exist")]
    PackageNotFound(PackageId),
    #[error("Package {0} is referenced by {1} order(s) and cannot be deleted")]
    PackageInUse(PackageId, i64),
}

impl From<CatalogError> for CatalogApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(s) => Self::DatabaseError(s),
            CatalogError::PackageNotFound(id) => Self::PackageNotFound(id),
            CatalogError::PackageInUse(id, n) => Self::PackageInUse(id, n),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid input. {0}")]
    InvalidInput(String),
    #[error("Package {0} does not exist")]
    PackageNotFound(PackageId),
    #[error("The date {0} is already booked")]
    ScheduleConflict(NaiveDate),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error(transparent)]
    MalformedOrderId(#[from] MalformedOrderId),
    #[error("{0}")]
    InvalidTransition(#[from] TransitionError),
    #[error("Order {0} kept changing while a status update was being applied")]
    Contention(OrderId),
}

impl From<BookingDatabaseError> for OrderFlowError {
    fn from(e: BookingDatabaseError) -> Self {
        match e {
            BookingDatabaseError::DatabaseError(s) => Self::DatabaseError(s),
            BookingDatabaseError::ScheduleConflict(date) => Self::ScheduleConflict(date),
            BookingDatabaseError::OrderNotFound(id) => Self::OrderNotFound(id),
        }
    }
}

impl From<CatalogError> for OrderFlowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::PackageNotFound(id) => Self::PackageNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

/// Reasons a payment leg may not be paid right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaymentGuardError {
    #[error("The deposit has not been paid yet, so the balance cannot be paid")]
    DepositNotPaid,
    #[error("The deposit has already been paid")]
    DepositAlreadyPaid,
    #[error("The balance has already been paid")]
    BalanceAlreadyPaid,
    #[error("The order has been cancelled")]
    OrderCancelled,
    #[error("The order changed while the payment was being created. Please try again")]
    Superseded,
}

/// Failures talking to the payment gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway answered, but not with success. The status and body are passed back to the caller.
    #[error("The payment gateway rejected the request with status {status}")]
    Upstream { status: u16, body: String },
    #[error("The payment gateway is unavailable. {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Error)]
pub enum PaymentApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("{0}")]
    Guard(#[from] PaymentGuardError),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
}

impl From<BookingDatabaseError> for PaymentApiError {
    fn from(e: BookingDatabaseError) -> Self {
        match e {
            BookingDatabaseError::OrderNotFound(id) => Self::OrderNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<CatalogError> for PaymentApiError {
    fn from(e: CatalogError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
