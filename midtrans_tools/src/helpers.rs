use sha2::{Digest, Sha512};

use crate::MidtransNotification;

/// Calculates the signature Midtrans attaches to notifications:
/// `hex(SHA512(order_id + status_code + gross_amount + server_key))`.
pub fn notification_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// Returns true if the notification carries a signature matching the given server key.
pub fn is_valid_signature(notification: &MidtransNotification, server_key: &str) -> bool {
    let (Some(status_code), Some(gross_amount), Some(signature)) =
        (&notification.status_code, &notification.gross_amount, &notification.signature_key)
    else {
        return false;
    };
    let expected = notification_signature(&notification.order_id, status_code, gross_amount, server_key);
    expected.eq_ignore_ascii_case(signature)
}

/// `Basic` authorization header value for the Snap API: the server key is the username, and the password is empty.
pub fn basic_auth_header(server_key: &str) -> String {
    format!("Basic {}", base64::encode(format!("{server_key}:")))
}
