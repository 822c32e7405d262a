use serde::{Deserialize, Serialize};

use crate::db_types::{LegStatus, Order};

/// A booking was stored and its date reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// At least one of an order's status fields changed, either because of a gateway notification or an admin action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_order: Order,
    pub new_order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_order: Order, new_order: Order) -> Self {
        Self { old_order, new_order }
    }

    /// True if the deposit went from unpaid to paid with this change.
    pub fn deposit_paid(&self) -> bool {
        self.old_order.dp_status != LegStatus::Paid && self.new_order.dp_status == LegStatus::Paid
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
}
