use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use booking_engine::{
    db_types::{LegStatus, OrderStatusType},
    events::EventProducers,
    OrderFlowApi,
};
use midtrans_tools::helpers::notification_signature;
use serde_json::{json, Value};

use super::{
    helpers::{deposit_paid_order, order, send_request, ORDER_ID, TEST_SERVER_KEY},
    mocks::MockBookingStore,
};
use crate::routes::MidtransNotificationRoute;

fn configure(store: MockBookingStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(MidtransNotificationRoute::<MockBookingStore>::new())
            .app_data(web::Data::new(OrderFlowApi::new(store, EventProducers::default())));
    }
}

fn notification(order_id: &str, status: &str, gross_amount: &str) -> Value {
    json!({
        "order_id": order_id,
        "transaction_status": status,
        "transaction_id": "tx-1",
        "fraud_status": "accept",
        "payment_type": "bank_transfer",
        "status_code": "200",
        "gross_amount": gross_amount,
        "signature_key": notification_signature(order_id, "200", gross_amount, TEST_SERVER_KEY),
    })
}

fn notify(body: Value) -> TestRequest {
    TestRequest::post().uri("/midtrans/notification").set_json(body)
}

#[actix_web::test]
async fn deposit_settlement() {
    let _ = env_logger::try_init().ok();
    let updated = Arc::new(AtomicBool::new(false));
    let mut store = MockBookingStore::new();
    let flag = updated.clone();
    store.expect_fetch_order().returning(move |_| {
        let o = if flag.load(Ordering::SeqCst) { deposit_paid_order() } else { order() };
        Ok(Some(o))
    });
    let flag = updated.clone();
    store
        .expect_update_order_status()
        .withf(|id, expected, update, metadata| {
            id.as_str() == ORDER_ID &&
                expected.dp_status == LegStatus::Pending &&
                update.status == OrderStatusType::DpPaid &&
                update.dp_status == LegStatus::Paid &&
                update.dp_paid_at.is_some() &&
                metadata.transaction_status.as_deref() == Some("settlement") &&
                metadata.payment_type.as_deref() == Some("bank_transfer")
        })
        .times(1)
        .returning(move |_, _, _, _| {
            flag.store(true, Ordering::SeqCst);
            Ok(true)
        });
    let req = notify(notification(&format!("{ORDER_ID}_dp"), "settlement", "3000000.00"));
    let (status, body) = send_request(req, None, configure(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, r#"{"success":true,"message":"Notification processed"}"#);
    assert!(updated.load(Ordering::SeqCst));
}

#[actix_web::test]
async fn repeated_settlements_change_nothing() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(deposit_paid_order())));
    store.expect_update_order_status().never();
    let req = notify(notification(&format!("{ORDER_ID}_dp"), "settlement", "3000000.00"));
    let (status, body) = send_request(req, None, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Notification processed. No change"}"#);
}

#[actix_web::test]
async fn late_pending_is_ignored() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(deposit_paid_order())));
    store.expect_update_order_status().never();
    let req = notify(notification(&format!("{ORDER_ID}_dp"), "pending", "3000000.00"));
    let (status, body) = send_request(req, None, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Notification ignored. The payment has already been settled"}"#);
}

#[actix_web::test]
async fn forged_notifications_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut body = notification(&format!("{ORDER_ID}_dp"), "settlement", "3000000.00");
    body["signature_key"] = json!(notification_signature(&format!("{ORDER_ID}_dp"), "200", "3000000.00", "guess"));
    let (status, res) = send_request(notify(body), None, configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(res, r#"{"error":"Authentication Error. The notification signature is invalid."}"#);

    let mut body = notification(&format!("{ORDER_ID}_dp"), "settlement", "3000000.00");
    body.as_object_mut().unwrap().remove("signature_key");
    let (status, _) = send_request(notify(body), None, configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_merchant_order_id() {
    let _ = env_logger::try_init().ok();
    let req = notify(notification(ORDER_ID, "settlement", "3000000.00"));
    let (status, _) = send_request(req, None, configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = notify(notification(&format!("{ORDER_ID}_full"), "settlement", "3000000.00"));
    let (status, _) = send_request(req, None, configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn notification_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(None));
    let req = notify(notification("deadbeef_dp", "settlement", "3000000.00"));
    let (status, body) = send_request(req, None, configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. The requested order deadbeef does not exist"}"#);
}

#[actix_web::test]
async fn unknown_transaction_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order())));
    store.expect_update_order_status().never();
    let req = notify(notification(&format!("{ORDER_ID}_dp"), "refund", "3000000.00"));
    let (status, body) = send_request(req, None, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"'refund' is not a recognised gateway transaction status"}"#);
}

#[actix_web::test]
async fn notification_must_be_json() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/midtrans/notification")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("order_id=abc_dp");
    let (status, _) = send_request(req, None, configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn notifications_for_an_earlier_balance_attempt_are_ignored() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| {
        let mut o = deposit_paid_order();
        o.final_attempt = 2;
        o.final_transaction_id = Some("tx-final-2".into());
        Ok(Some(o))
    });
    store.expect_update_order_status().never();
    let req = notify(notification(&format!("{ORDER_ID}_final"), "expire", "7000000.00"));
    let (status, body) = send_request(req, None, configure(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, r#"{"success":true,"message":"Notification ignored. It belongs to an earlier payment attempt"}"#);
}
