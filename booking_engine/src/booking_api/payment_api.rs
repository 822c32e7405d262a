//! Starting payments for the two legs of an order.
//!
//! The engine does not talk to a payment gateway itself. Anything that implements [`PaymentProvider`] can be plugged
//! in; the server uses the Midtrans Snap API.
use std::fmt::Debug;

use dbk_common::Rupiah;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    booking_api::errors::{GatewayError, PaymentApiError, PaymentGuardError},
    db::traits::{BookingDatabase, CatalogManagement},
    db_types::{LegStatus, Order, OrderId, OrderStatusType, PackageId, UserId},
    order_lifecycle::{MerchantOrderId, PaymentLeg},
};

/// The person paying. Orders can only be paid by the account that booked them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payer {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
}

/// A request to open a hosted payment page for a single line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub merchant_order_id: String,
    pub amount: Rupiah,
    pub item_id: PackageId,
    pub item_name: String,
    pub customer_email: String,
    pub customer_name: String,
}

/// A payment page opened by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub redirect_url: String,
    /// The gateway's reference for the transaction.
    pub transaction_id: String,
}

#[allow(async_fn_in_trait)]
pub trait PaymentProvider {
    async fn create_transaction(&self, request: PaymentRequest) -> Result<PaymentSession, GatewayError>;
}

pub struct PaymentApi<B, P> {
    db: B,
    provider: P,
}

impl<B, P> Debug for PaymentApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B, P> PaymentApi<B, P> {
    pub fn new(db: B, provider: P) -> Self {
        Self { db, provider }
    }
}

/// Checks whether `leg` of `order` may be paid now.
///
/// * Nothing can be paid on a cancelled order.
/// * The deposit can be paid until it is paid.
/// * The balance can be paid once the deposit is paid, until it is paid itself.
pub fn check_payable(order: &Order, leg: PaymentLeg) -> Result<(), PaymentGuardError> {
    if order.status == OrderStatusType::Cancelled {
        return Err(PaymentGuardError::OrderCancelled);
    }
    match leg {
        PaymentLeg::Deposit if order.dp_status == LegStatus::Paid => Err(PaymentGuardError::DepositAlreadyPaid),
        PaymentLeg::Deposit => Ok(()),
        PaymentLeg::Balance if order.dp_status != LegStatus::Paid => Err(PaymentGuardError::DepositNotPaid),
        PaymentLeg::Balance if order.final_status == LegStatus::Paid => Err(PaymentGuardError::BalanceAlreadyPaid),
        PaymentLeg::Balance => Ok(()),
    }
}

impl<B, P> PaymentApi<B, P>
where
    B: BookingDatabase + CatalogManagement,
    P: PaymentProvider,
{
    /// Opens a payment page for the 30% deposit of an order.
    pub async fn create_deposit_payment(
        &self,
        order_id: &OrderId,
        payer: &Payer,
    ) -> Result<PaymentSession, PaymentApiError> {
        self.create_payment(order_id, PaymentLeg::Deposit, payer).await
    }

    /// Opens a payment page for the 70% balance of an order. The deposit must already be paid.
    pub async fn create_balance_payment(
        &self,
        order_id: &OrderId,
        payer: &Payer,
    ) -> Result<PaymentSession, PaymentApiError> {
        self.create_payment(order_id, PaymentLeg::Balance, payer).await
    }

    async fn create_payment(
        &self,
        order_id: &OrderId,
        leg: PaymentLeg,
        payer: &Payer,
    ) -> Result<PaymentSession, PaymentApiError> {
        let order = self.fetch_order_for(order_id, payer).await?;
        check_payable(&order, leg)?;
        let package_name = match self.db.fetch_package(&order.package_id).await? {
            Some(p) => p.package.name,
            None => {
                warn!("💳️ Package {} for order {order_id} has disappeared", order.package_id);
                order.package_id.to_string()
            },
        };
        let customer_name = if payer.name.trim().is_empty() { "Customer".to_string() } else { payer.name.clone() };
        let merchant_order_id = MerchantOrderId::new(order.id.clone(), leg).with_attempt(leg.next_attempt(&order));
        let request = PaymentRequest {
            merchant_order_id: merchant_order_id.to_string(),
            amount: leg.amount(&order),
            item_id: order.package_id.clone(),
            item_name: format!("{package_name} - {}", leg.label()),
            customer_email: payer.email.clone(),
            customer_name,
        };
        debug!("💳️ Requesting a {leg} payment of {} for order {order_id}", request.amount);
        let session = self.provider.create_transaction(request).await.map_err(|e| {
            warn!("💳️ Could not create the {leg} payment for order {order_id}. {e}");
            e
        })?;
        if !self.db.record_transaction_id(&merchant_order_id, &session.transaction_id).await? {
            // The order changed between the check and the write. Report why, if we can tell.
            let current = self.fetch_order_for(order_id, payer).await?;
            let reason = check_payable(&current, leg).err().unwrap_or(PaymentGuardError::Superseded);
            warn!("💳️ The {leg} payment {} for order {order_id} was not recorded. {reason}", session.transaction_id);
            return Err(reason.into());
        }
        info!("💳️ {leg} payment {} created for order {order_id} ({merchant_order_id})", session.transaction_id);
        Ok(session)
    }

    async fn fetch_order_for(&self, order_id: &OrderId, payer: &Payer) -> Result<Order, PaymentApiError> {
        let order = self.db.fetch_order(order_id).await?.ok_or_else(|| PaymentApiError::OrderNotFound(order_id.clone()))?;
        if order.user_id != payer.user_id {
            debug!("💳️ User {} tried to pay for order {order_id}, which is not theirs", payer.user_id);
            return Err(PaymentApiError::OrderNotFound(order_id.clone()));
        }
        Ok(order)
    }
}
