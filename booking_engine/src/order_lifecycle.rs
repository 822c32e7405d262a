//! # Order lifecycle rules
//!
//! Pure functions describing how an order moves through its life. Nothing in this module touches the database; the
//! [`crate::OrderFlowApi`] reads the current order, asks these functions what should happen, and then applies the
//! answer with a conditional update.
//!
//! An order has three status fields: the overall [`OrderStatusType`], and a [`LegStatus`] for each of the two payment
//! legs (the 30% deposit and the 70% balance). The gateway tells us which leg a notification is about through a suffix
//! on the merchant order id: `<order id>_dp` or `<order id>_final`. The gateway refuses to reuse a merchant order id,
//! so a balance that is paid again after a failed attempt gets a numbered id: `<order id>_final-2`, `_final-3` and so
//! on. Notifications about an earlier balance attempt than the one the order is on are superseded and ignored.
//!
//! ## Gateway notifications
//!
//! | incoming status              | leg     | leg status | overall status                      |
//! |------------------------------|---------|------------|-------------------------------------|
//! | settlement, capture          | deposit | PAID       | PENDING → DP_PAID                   |
//! | settlement, capture          | balance | PAID       | DP_PAID, IN_PROGRESS → FINISHED     |
//! | cancel, expire, failure, deny| deposit | FAILED     | → CANCELLED                         |
//! | cancel, expire, failure, deny| balance | FAILED     | unchanged                           |
//! | pending                      | either  | PENDING    | unchanged                           |
//!
//! Leg statuses only move forward: `PENDING → PAID | FAILED`. Once a leg is `PAID` or `FAILED`, a notification asking
//! for a different status is stale (e.g. a late `pending` after `settlement`) and is ignored. A notification that
//! repeats the current status changes nothing. Balance notifications for an order whose deposit is not paid are
//! rejected.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use dbk_common::Rupiah;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{LegStatus, Order, OrderId, OrderStatusType};

/// Share of the package price that is due as a deposit, in percent.
pub const DEPOSIT_PERCENT: i64 = 30;

/// Highest price the catalog accepts for a package.
pub const MAX_PACKAGE_PRICE: i64 = i64::MAX / 100;

/// Splits a package price into the deposit and the balance.
///
/// The deposit is 30% of the price, rounded half up to the nearest rupiah. The balance is whatever remains, so the two
/// always add up to the price. For example, 101 splits into 30 + 71 and 105 into 32 + 73.
pub fn split_deposit(price: Rupiah) -> (Rupiah, Rupiah) {
    let p = price.value().max(0);
    // (p * 30 + 50) / 100 never exceeds p, so it always fits back into an i64
    let dp = ((i128::from(p) * i128::from(DEPOSIT_PERCENT) + 50) / 100) as i64;
    (Rupiah::from(dp), Rupiah::from(p - dp))
}

//--------------------------------------      PaymentLeg       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentLeg {
    Deposit,
    Balance,
}

impl PaymentLeg {
    pub fn suffix(&self) -> &'static str {
        match self {
            PaymentLeg::Deposit => "dp",
            PaymentLeg::Balance => "final",
        }
    }

    /// The label used for the line item on the gateway's payment page.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentLeg::Deposit => "Deposit",
            PaymentLeg::Balance => "Balance",
        }
    }

    pub fn amount(&self, order: &Order) -> Rupiah {
        match self {
            PaymentLeg::Deposit => order.dp_amount,
            PaymentLeg::Balance => order.final_amount,
        }
    }

    pub fn status(&self, order: &Order) -> LegStatus {
        match self {
            PaymentLeg::Deposit => order.dp_status,
            PaymentLeg::Balance => order.final_status,
        }
    }

    /// The attempt number for the next payment page opened for this leg. A failed balance starts a new attempt;
    /// otherwise the current attempt is reused. The deposit is never retried, since a failed deposit cancels the order.
    pub fn next_attempt(&self, order: &Order) -> i64 {
        match self {
            PaymentLeg::Deposit => 1,
            PaymentLeg::Balance if order.final_status == LegStatus::Failed => order.final_attempt + 1,
            PaymentLeg::Balance => order.final_attempt.max(1),
        }
    }
}

impl Display for PaymentLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

//--------------------------------------    MerchantOrderId    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed merchant order id: {0}")]
pub struct MalformedOrderId(pub String);

/// The order id as the gateway knows it: `<order id>_<leg suffix>`, or `<order id>_<leg suffix>-<attempt>` from the
/// second attempt on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantOrderId {
    pub order_id: OrderId,
    pub leg: PaymentLeg,
    /// Starts at 1.
    pub attempt: i64,
}

impl MerchantOrderId {
    pub fn new(order_id: OrderId, leg: PaymentLeg) -> Self {
        Self { order_id, leg, attempt: 1 }
    }

    pub fn with_attempt(self, attempt: i64) -> Self {
        Self { attempt: attempt.max(1), ..self }
    }
}

impl FromStr for MerchantOrderId {
    type Err = MalformedOrderId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MalformedOrderId(s.to_string());
        let (base, suffix) = s.rsplit_once('_').ok_or_else(malformed)?;
        let (suffix, attempt) = match suffix.split_once('-') {
            Some((suffix, n)) => (suffix, n.parse::<i64>().ok().filter(|n| *n > 1).ok_or_else(malformed)?),
            None => (suffix, 1),
        };
        let leg = match suffix {
            "dp" => PaymentLeg::Deposit,
            "final" => PaymentLeg::Balance,
            _ => return Err(MalformedOrderId(s.to_string())),
        };
        if base.trim().is_empty() {
            return Err(MalformedOrderId(s.to_string()));
        }
        Ok(Self { order_id: OrderId::from(base), leg, attempt })
    }
}

impl Display for MerchantOrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.order_id.as_str(), self.leg.suffix())?;
        if self.attempt > 1 {
            write!(f, "-{}", self.attempt)?;
        }
        Ok(())
    }
}

//--------------------------------------     GatewayStatus     ---------------------------------------------------------
/// The transaction statuses a payment gateway reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayStatus {
    Settlement,
    Capture,
    Pending,
    Cancel,
    Expire,
    Failure,
    Deny,
}

impl GatewayStatus {
    /// The leg status this gateway status maps onto.
    pub fn leg_status(&self) -> LegStatus {
        match self {
            Self::Settlement | Self::Capture => LegStatus::Paid,
            Self::Pending => LegStatus::Pending,
            Self::Cancel | Self::Expire | Self::Failure | Self::Deny => LegStatus::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settlement => "settlement",
            Self::Capture => "capture",
            Self::Pending => "pending",
            Self::Cancel => "cancel",
            Self::Expire => "expire",
            Self::Failure => "failure",
            Self::Deny => "deny",
        }
    }
}

impl Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "settlement" => Ok(Self::Settlement),
            "capture" => Ok(Self::Capture),
            "pending" => Ok(Self::Pending),
            "cancel" => Ok(Self::Cancel),
            "expire" => Ok(Self::Expire),
            "failure" => Ok(Self::Failure),
            "deny" => Ok(Self::Deny),
            _ => Err(TransitionError::UnknownGatewayStatus(s.to_string())),
        }
    }
}

//--------------------------------------      Transitions      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("'{0}' is not a recognised gateway transaction status")]
    UnknownGatewayStatus(String),
    #[error("A balance notification arrived for an order whose deposit is {0}")]
    DepositNotPaid(LegStatus),
    #[error("The order is already {0}")]
    NoOp(OrderStatusType),
    #[error("An order cannot be changed from {from} to {to}")]
    Forbidden { from: OrderStatusType, to: OrderStatusType },
}

/// New values for an order's status fields. The paid-at timestamps are only set when a leg becomes paid; storage must
/// never overwrite a timestamp that is already set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusUpdate {
    pub status: OrderStatusType,
    pub dp_status: LegStatus,
    pub final_status: LegStatus,
    pub dp_paid_at: Option<DateTime<Utc>>,
    pub final_paid_at: Option<DateTime<Utc>>,
}

impl OrderStatusUpdate {
    fn from_order(order: &Order) -> Self {
        Self {
            status: order.status,
            dp_status: order.dp_status,
            final_status: order.final_status,
            dp_paid_at: None,
            final_paid_at: None,
        }
    }
}

/// What a gateway notification means for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The order must be updated with these values.
    Apply(OrderStatusUpdate),
    /// The leg is already in the reported status.
    Unchanged,
    /// The leg has already reached a different final status; the notification is stale.
    Ignored { current: LegStatus, reported: LegStatus },
}

/// Works out what a gateway notification does to `order`. See the module docs for the transition table.
pub fn apply_notification(
    order: &Order,
    leg: PaymentLeg,
    status: GatewayStatus,
    now: DateTime<Utc>,
) -> Result<Transition, TransitionError> {
    if leg == PaymentLeg::Balance && order.dp_status != LegStatus::Paid {
        return Err(TransitionError::DepositNotPaid(order.dp_status));
    }
    let current = leg.status(order);
    let reported = status.leg_status();
    if current == reported {
        return Ok(Transition::Unchanged);
    }
    if current.is_terminal() {
        return Ok(Transition::Ignored { current, reported });
    }
    let mut update = OrderStatusUpdate::from_order(order);
    use LegStatus::*;
    use OrderStatusType::*;
    match (leg, reported) {
        (PaymentLeg::Deposit, Paid) => {
            update.dp_status = Paid;
            update.dp_paid_at = Some(now);
            if order.status == OrderStatusType::Pending {
                update.status = DpPaid;
            }
        },
        (PaymentLeg::Deposit, Failed) => {
            update.dp_status = Failed;
            update.status = Cancelled;
        },
        (PaymentLeg::Balance, Paid) => {
            update.final_status = Paid;
            update.final_paid_at = Some(now);
            if matches!(order.status, DpPaid | InProgress) {
                update.status = Finished;
            }
        },
        (PaymentLeg::Balance, Failed) => {
            update.final_status = Failed;
        },
        // A non-terminal leg can only be Pending, and Pending == Pending was handled above
        (_, LegStatus::Pending) => return Ok(Transition::Unchanged),
    }
    Ok(Transition::Apply(update))
}

/// True if the notification is about an earlier balance attempt than the one `order` is on.
pub fn is_superseded(order: &Order, merchant_id: &MerchantOrderId) -> bool {
    merchant_id.leg == PaymentLeg::Balance && merchant_id.attempt < order.final_attempt
}

/// Validates a manual (admin) status change and returns the new status.
///
/// | From \ To   | IN_PROGRESS | COMPLETED | CANCELLED |
/// |-------------|-------------|-----------|-----------|
/// | PENDING     | Err         | Err       | Ok        |
/// | DP_PAID     | Ok          | Err       | Ok        |
/// | FINISHED    | Err         | Ok        | Err       |
///
/// Every other change is forbidden, including anything that would move a payment-driven status (`DP_PAID`,
/// `FINISHED`) by hand. Changing a status to itself is a no-op and returns an error.
pub fn manual_transition(
    current: OrderStatusType,
    requested: OrderStatusType,
) -> Result<OrderStatusType, TransitionError> {
    use OrderStatusType::*;
    match (current, requested) {
        (old, new) if old == new => Err(TransitionError::NoOp(old)),
        (DpPaid, InProgress) | (Finished, Completed) | (Pending | DpPaid, Cancelled) => Ok(requested),
        (from, to) => Err(TransitionError::Forbidden { from, to }),
    }
}
