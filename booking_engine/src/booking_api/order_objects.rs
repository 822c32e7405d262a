use serde::{Deserialize, Serialize};

use crate::{
    booking_api::errors::OrderFlowError,
    db_types::{Order, Package},
};

/// A booking as submitted by a customer. Every field is required. Amounts are never taken from the customer; they are
/// derived from the package price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub package_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp of which only the date is used.
    pub schedule_date: String,
}

impl BookingRequest {
    /// Trims every field and checks that none is empty.
    pub fn validated(self) -> Result<Self, OrderFlowError> {
        Ok(Self {
            package_id: required("packageId", self.package_id)?,
            customer_name: required("customerName", self.customer_name)?,
            customer_email: required("customerEmail", self.customer_email)?,
            customer_phone: required("customerPhone", self.customer_phone)?,
            customer_address: required("customerAddress", self.customer_address)?,
            schedule_date: required("scheduleDate", self.schedule_date)?,
        })
    }
}

fn required(name: &str, value: String) -> Result<String, OrderFlowError> {
    let value = value.trim();
    if value.is_empty() {
        Err(OrderFlowError::InvalidInput(format!("{name} is required")))
    } else {
        Ok(value.to_string())
    }
}

/// The parts of a gateway notification that the order flow acts on. Authenticity is checked before this point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// `<order id>_dp` or `<order id>_final`, with `-<attempt>` appended from the second balance attempt on
    pub merchant_order_id: String,
    pub transaction_status: String,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
    pub transaction_id: Option<String>,
    /// A decimal string, e.g. `"3000000.00"`.
    pub gross_amount: Option<String>,
}

/// What processing a gateway notification did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The order was updated. Carries the new order.
    Applied(Order),
    /// The leg already had the reported status.
    Unchanged(Order),
    /// The leg had already reached a different final status, so the notification was stale.
    Ignored(Order),
    /// The notification was about an earlier balance attempt than the one the order is on.
    Superseded(Order),
}

impl NotificationOutcome {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied(o) | Self::Unchanged(o) | Self::Ignored(o) | Self::Superseded(o) => o,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Applied(_) => "Notification processed",
            Self::Unchanged(_) => "Notification processed. No change",
            Self::Ignored(_) => "Notification ignored. The payment has already been settled",
            Self::Superseded(_) => "Notification ignored. It belongs to an earlier payment attempt",
        }
    }
}

/// An order together with the package it books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub package: Option<Package>,
}
