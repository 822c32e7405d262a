//! Glue between the booking engine and the Midtrans Snap API.
use booking_engine::{order_objects::PaymentNotification, GatewayError, PaymentProvider, PaymentRequest, PaymentSession};
use log::*;
use midtrans_tools::{
    helpers::is_valid_signature,
    CustomerDetails,
    ItemDetails,
    MidtransApi,
    MidtransApiError,
    MidtransNotification,
    SnapTransactionRequest,
    TransactionDetails,
};

#[derive(Clone)]
pub struct MidtransProvider {
    api: MidtransApi,
}

impl MidtransProvider {
    pub fn new(api: MidtransApi) -> Self {
        Self { api }
    }
}

impl PaymentProvider for MidtransProvider {
    async fn create_transaction(&self, request: PaymentRequest) -> Result<PaymentSession, GatewayError> {
        let snap_request = snap_request(request);
        let tx = self.api.create_transaction(&snap_request).await.map_err(gateway_error)?;
        // `create_transaction` only succeeds when there is a reference
        let transaction_id = tx.reference().unwrap_or_default().to_string();
        Ok(PaymentSession { redirect_url: tx.redirect_url, transaction_id })
    }
}

pub fn snap_request(request: PaymentRequest) -> SnapTransactionRequest {
    let amount = request.amount.value();
    SnapTransactionRequest {
        transaction_details: TransactionDetails { order_id: request.merchant_order_id, gross_amount: amount },
        item_details: vec![ItemDetails {
            id: request.item_id.to_string(),
            price: amount,
            quantity: 1,
            name: request.item_name,
        }],
        customer_details: CustomerDetails { email: request.customer_email, first_name: request.customer_name },
    }
}

fn gateway_error(e: MidtransApiError) -> GatewayError {
    match e {
        MidtransApiError::QueryError { status, message } => {
            warn!("💳️ Midtrans rejected the transaction with status {status}. {message}");
            GatewayError::Upstream { status, body: message }
        },
        e => {
            error!("💳️ Could not reach Midtrans. {e}");
            GatewayError::Unavailable(e.to_string())
        },
    }
}

/// Checks the signature on a notification. An empty server key never validates anything.
pub fn verify_notification(notification: &MidtransNotification, server_key: &str) -> bool {
    !server_key.is_empty() && is_valid_signature(notification, server_key)
}

pub fn to_payment_notification(n: MidtransNotification) -> PaymentNotification {
    PaymentNotification {
        merchant_order_id: n.order_id,
        transaction_status: n.transaction_status,
        fraud_status: n.fraud_status,
        payment_type: n.payment_type,
        transaction_id: n.transaction_id,
        gross_amount: n.gross_amount,
    }
}
