use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub id: String,
    pub price: i64,
    pub quantity: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: String,
    pub first_name: String,
}

/// Request body for `POST /snap/v1/transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapTransactionRequest {
    pub transaction_details: TransactionDetails,
    pub item_details: Vec<ItemDetails>,
    pub customer_details: CustomerDetails,
}

/// The Snap API answers with a token and a hosted payment page. Some integrations also return a `transaction_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapTransaction {
    #[serde(default)]
    pub token: Option<String>,
    pub redirect_url: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl SnapTransaction {
    /// The gateway's reference for this transaction: the transaction id if one was returned, otherwise the Snap token.
    pub fn reference(&self) -> Option<&str> {
        self.transaction_id.as_deref().or(self.token.as_deref())
    }
}

/// The HTTP notification body Midtrans posts to the merchant's notification URL.
///
/// Only the fields the booking flow reads are declared. Everything else in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidtransNotification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub gross_amount: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub signature_key: Option<String>,
}
