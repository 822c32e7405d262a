use std::fmt::Debug;

use chrono::{NaiveDate, Utc};
use dbk_common::Rupiah;
use log::*;

use crate::{
    booking_api::{
        errors::OrderFlowError,
        order_objects::{BookingRequest, NotificationOutcome, OrderDetails, PaymentNotification},
    },
    db::traits::{BookingDatabase, CatalogManagement},
    db_types::{NewOrder, Order, OrderId, OrderStatusType, OrderSummary, PackageId, PaymentMetadata, UserId},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    helpers::parse_schedule_date,
    order_lifecycle::{
        apply_notification,
        is_superseded,
        manual_transition,
        split_deposit,
        GatewayStatus,
        MerchantOrderId,
        PaymentLeg,
        Transition,
    },
};

/// How many times a notification is re-evaluated when the order changes underneath it.
const MAX_STATUS_UPDATE_ATTEMPTS: usize = 3;

/// `OrderFlowApi` is the primary API for the booking flow: taking bookings, answering schedule queries, and moving
/// orders through their lifecycle in response to gateway notifications and admin actions.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: BookingDatabase + CatalogManagement
{
    /// Takes a booking for `user_id`.
    ///
    /// The amounts are derived from the package price: 30% deposit (rounded half up) and the remainder as balance. The
    /// order is stored and its date reserved atomically. If the date is taken, nothing is stored and
    /// [`OrderFlowError::ScheduleConflict`] is returned.
    pub async fn create_order(&self, user_id: &UserId, request: BookingRequest) -> Result<Order, OrderFlowError> {
        let request = request.validated()?;
        let schedule_date = parse_schedule_date(&request.schedule_date)
            .ok_or_else(|| OrderFlowError::InvalidInput(format!("'{}' is not a valid date", request.schedule_date)))?;
        let package_id = PackageId::from(request.package_id);
        let package = self
            .db
            .fetch_package(&package_id)
            .await?
            .ok_or_else(|| OrderFlowError::PackageNotFound(package_id.clone()))?;
        let total_amount = package.package.price;
        let (dp_amount, final_amount) = split_deposit(total_amount);
        let new_order = NewOrder {
            id: OrderId::random(),
            user_id: user_id.clone(),
            package_id,
            schedule_date,
            customer_name: request.customer_name,
            customer_email: request.customer_email,
            customer_phone: request.customer_phone,
            customer_address: request.customer_address,
            total_amount,
            dp_amount,
            final_amount,
        };
        let order = self.db.insert_booking(new_order).await?;
        info!(
            "🔄️📦️ Order {} booked {} for {}. Total {}, deposit {}, balance {}",
            order.id, order.schedule_date, order.customer_name, order.total_amount, order.dp_amount, order.final_amount
        );
        for producer in &self.producers.order_created_producer {
            producer.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    /// Is the given date already reserved? Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub async fn check_schedule(&self, date: &str) -> Result<bool, OrderFlowError> {
        let date = parse_schedule_date(date)
            .ok_or_else(|| OrderFlowError::InvalidInput(format!("'{date}' is not a valid date")))?;
        let booked = self.db.is_date_booked(date).await?;
        trace!("🔄️📅️ {date} booked: {booked}");
        Ok(booked)
    }

    /// All reserved dates, soonest first.
    pub async fn list_booked_dates(&self) -> Result<Vec<NaiveDate>, OrderFlowError> {
        let schedules = self.db.fetch_schedules().await?;
        Ok(schedules.into_iter().map(|s| s.date).collect())
    }

    pub async fn my_orders(&self, user_id: &UserId) -> Result<Vec<OrderSummary>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }

    pub async fn all_orders(&self) -> Result<Vec<OrderSummary>, OrderFlowError> {
        let orders = self.db.fetch_all_orders().await?;
        Ok(orders)
    }

    /// Fetches an order with its package. Only the owner of the order and admins may see it; for anyone else the
    /// order does not exist.
    pub async fn order_by_id(
        &self,
        id: &OrderId,
        viewer: &UserId,
        is_admin: bool,
    ) -> Result<OrderDetails, OrderFlowError> {
        let order = self.db.fetch_order(id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(id.clone()))?;
        if !is_admin && &order.user_id != viewer {
            debug!("🔄️📦️ User {viewer} asked for order {id}, which belongs to someone else");
            return Err(OrderFlowError::OrderNotFound(id.clone()));
        }
        let package = self.db.fetch_package(&order.package_id).await?;
        Ok(OrderDetails { order, package })
    }

    /// Applies a payment gateway notification to the order it refers to.
    ///
    /// The leg is taken from the merchant order id suffix. Notifications about an earlier balance attempt are
    /// superseded and change nothing. Otherwise the transition rules in [`crate::order_lifecycle`]
    /// decide the new state. The write is conditional on the order not having changed since it was read; if it has,
    /// the notification is re-evaluated against the fresh order, up to a fixed number of attempts.
    pub async fn process_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<NotificationOutcome, OrderFlowError> {
        let merchant_id = notification.merchant_order_id.parse::<MerchantOrderId>()?;
        let (order_id, leg) = (merchant_id.order_id.clone(), merchant_id.leg);
        let mut order = self.fetch_existing_order(&order_id).await?;
        let status = notification.transaction_status.parse::<GatewayStatus>().map_err(|e| {
            warn!("🔄️💳️ Notification for {} has an unrecognised status: {e}", notification.merchant_order_id);
            e
        })?;
        self.check_gross_amount(&order, leg, &notification);
        let metadata = PaymentMetadata {
            transaction_status: Some(status.as_str().to_string()),
            fraud_status: notification.fraud_status.clone(),
            payment_type: notification.payment_type.clone(),
        };
        for attempt in 1..=MAX_STATUS_UPDATE_ATTEMPTS {
            if is_superseded(&order, &merchant_id) {
                info!(
                    "🔄️💳️ Ignoring '{status}' for {merchant_id}. Order {order_id} has moved on to balance attempt {}",
                    order.final_attempt
                );
                return Ok(NotificationOutcome::Superseded(order));
            }
            let update = match apply_notification(&order, leg, status, Utc::now())? {
                Transition::Unchanged => {
                    debug!("🔄️💳️ {leg} of order {order_id} is already {}. Nothing to do", leg.status(&order));
                    return Ok(NotificationOutcome::Unchanged(order));
                },
                Transition::Ignored { current, reported } => {
                    info!(
                        "🔄️💳️ Ignoring stale '{status}' notification for the {leg} of order {order_id}. The leg is \
                         already {current}, and cannot become {reported}"
                    );
                    return Ok(NotificationOutcome::Ignored(order));
                },
                Transition::Apply(update) => update,
            };
            let expected = order.snapshot();
            if self.db.update_order_status(&order_id, expected, &update, &metadata).await? {
                let new_order = self.fetch_existing_order(&order_id).await?;
                info!(
                    "🔄️💳️ '{status}' applied to the {leg} of order {order_id}. Order is now {} (deposit {}, balance {})",
                    new_order.status, new_order.dp_status, new_order.final_status
                );
                self.call_order_status_changed_hook(&order, &new_order).await;
                return Ok(NotificationOutcome::Applied(new_order));
            }
            debug!("🔄️💳️ Order {order_id} changed while applying '{status}' (attempt {attempt}). Re-reading it");
            order = self.fetch_existing_order(&order_id).await?;
        }
        error!("🔄️💳️ Gave up applying '{status}' to order {order_id} after {MAX_STATUS_UPDATE_ATTEMPTS} attempts");
        Err(OrderFlowError::Contention(order_id))
    }

    /// An admin-initiated status change. Only the transitions listed in
    /// [`crate::order_lifecycle::manual_transition`] are allowed. The payment legs are never touched.
    pub async fn modify_status_for_order(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        let status = manual_transition(order.status, new_status)?;
        if !self.db.set_order_status_if(order_id, order.status, status).await? {
            // Someone else changed the status first. Report it against the status as it is now.
            let current = self.fetch_existing_order(order_id).await?;
            manual_transition(current.status, new_status)?;
            return Err(OrderFlowError::Contention(order_id.clone()));
        }
        let new_order = self.fetch_existing_order(order_id).await?;
        info!("🔄️📦️ Order {order_id} manually moved from {} to {}", order.status, new_order.status);
        self.call_order_status_changed_hook(&order, &new_order).await;
        Ok(new_order)
    }

    async fn fetch_existing_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))
    }

    fn check_gross_amount(&self, order: &Order, leg: PaymentLeg, notification: &PaymentNotification) {
        let Some(gross) = notification.gross_amount.as_deref() else {
            return;
        };
        let expected = leg.amount(order);
        match Rupiah::try_from(gross) {
            Ok(amount) if amount == expected => {},
            Ok(amount) => warn!(
                "🔄️💳️ Gross amount {amount} in the notification for {} does not match the expected {expected}",
                notification.merchant_order_id
            ),
            Err(e) => warn!("🔄️💳️ Could not read the gross amount in the notification: {e}"),
        }
    }

    async fn call_order_status_changed_hook(&self, old_order: &Order, new_order: &Order) {
        for producer in &self.producers.order_status_changed_producer {
            debug!("🔄️📦️ Notifying order status changed hook subscribers");
            let event = OrderStatusChangedEvent::new(old_order.clone(), new_order.clone());
            producer.publish_event(event).await;
        }
    }
}

