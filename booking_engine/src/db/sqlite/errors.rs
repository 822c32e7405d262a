use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    db::traits::{AccountManagementError, BookingDatabaseError, CatalogError},
    db_types::{OrderId, PackageId},
};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("The date {0} is already booked")]
    ScheduleConflict(NaiveDate),
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),
    #[error("Package {0} does not exist")]
    PackageNotFound(PackageId),
    #[error("Package {0} is referenced by {1} order(s) and cannot be deleted")]
    PackageInUse(PackageId, i64),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl SqliteDatabaseError {
    /// True if the underlying driver error is a UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::DriverError(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<SqliteDatabaseError> for BookingDatabaseError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::ScheduleConflict(date) => Self::ScheduleConflict(date),
            SqliteDatabaseError::OrderNotFound(id) => Self::OrderNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<SqliteDatabaseError> for CatalogError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::PackageNotFound(id) => Self::PackageNotFound(id),
            SqliteDatabaseError::PackageInUse(id, count) => Self::PackageInUse(id, count),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<SqliteDatabaseError> for AccountManagementError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
