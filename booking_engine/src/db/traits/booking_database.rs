use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, OrderSummary, PaymentMetadata, Schedule, StatusSnapshot, UserId},
    order_lifecycle::{MerchantOrderId, OrderStatusUpdate},
};

/// This trait defines the storage behaviour behind the booking flow:
/// * Atomically storing a booking together with its date reservation.
/// * Looking up orders and reserved dates.
/// * Conditional status updates, so that concurrent payment notifications for the same order cannot overwrite each
///   other.
#[allow(async_fn_in_trait)]
pub trait BookingDatabase {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order and reserves its date in a single atomic transaction.
    ///
    /// If the date is already reserved, nothing is stored and [`BookingDatabaseError::ScheduleConflict`] is returned.
    /// Of two concurrent bookings for the same date, exactly one succeeds.
    async fn insert_booking(&self, order: NewOrder) -> Result<Order, BookingDatabaseError>;

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, BookingDatabaseError>;

    /// Orders placed by the given user, newest first.
    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<OrderSummary>, BookingDatabaseError>;

    /// Every order in the system, newest first.
    async fn fetch_all_orders(&self) -> Result<Vec<OrderSummary>, BookingDatabaseError>;

    async fn is_date_booked(&self, date: NaiveDate) -> Result<bool, BookingDatabaseError>;

    /// All reserved dates, soonest first.
    async fn fetch_schedules(&self) -> Result<Vec<Schedule>, BookingDatabaseError>;

    /// Writes the new status fields and gateway metadata for an order, provided that its status fields still equal
    /// `expected`. Returns `false` if they do not (i.e. something else changed the order first).
    async fn update_order_status(
        &self,
        id: &OrderId,
        expected: StatusSnapshot,
        update: &OrderStatusUpdate,
        metadata: &PaymentMetadata,
    ) -> Result<bool, BookingDatabaseError>;

    /// Sets the overall status of an order if it is currently `expected`. Returns `false` otherwise.
    async fn set_order_status_if(
        &self,
        id: &OrderId,
        expected: OrderStatusType,
        status: OrderStatusType,
    ) -> Result<bool, BookingDatabaseError>;

    /// Stores the gateway's transaction reference for one payment leg of an order. The write only happens if the leg
    /// may still be paid:
    /// * Deposit: the order is not cancelled, and the deposit is not yet paid.
    /// * Balance: the order is not cancelled, the deposit is paid and the balance is not, and the order is not on a
    ///   later attempt than `payment.attempt`. A failed balance is reset to pending, and the order moves to the new
    ///   attempt.
    ///
    /// Returns `false` if these conditions did not hold.
    async fn record_transaction_id(
        &self,
        payment: &MerchantOrderId,
        transaction_id: &str,
    ) -> Result<bool, BookingDatabaseError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), BookingDatabaseError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum BookingDatabaseError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The date {0} is already booked")]
    ScheduleConflict(NaiveDate),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for BookingDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        BookingDatabaseError::DatabaseError(e.to_string())
    }
}
