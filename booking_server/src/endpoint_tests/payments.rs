use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use booking_engine::{
    db_types::{LegStatus, OrderStatusType, UserId},
    order_lifecycle::PaymentLeg,
    GatewayError,
    PaymentApi,
    PaymentSession,
};
use serde_json::json;

use super::{
    helpers::{deposit_paid_order, json_body, order, package, send_request, user_token, ORDER_ID, OTHER_USER_ID},
    mocks::{MockBookingStore, MockGateway},
};
use crate::routes::{CreateBalancePaymentRoute, CreateDepositPaymentRoute};

fn configure(store: MockBookingStore, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(CreateDepositPaymentRoute::<MockBookingStore, MockGateway>::new())
            .service(CreateBalancePaymentRoute::<MockBookingStore, MockGateway>::new())
            .app_data(web::Data::new(PaymentApi::new(store, gateway)));
    }
}

fn session(id: &str) -> PaymentSession {
    PaymentSession {
        redirect_url: format!("https://app.sandbox.midtrans.com/snap/v4/redirection/{id}"),
        transaction_id: id.to_string(),
    }
}

fn pay_request(path: &str) -> TestRequest {
    TestRequest::post().uri(path).set_json(json!({ "orderId": ORDER_ID }))
}

#[actix_web::test]
async fn payments_need_a_session() {
    let _ = env_logger::try_init().ok();
    let req = pay_request("/payment/create");
    let (status, _) = send_request(req, None, configure(MockBookingStore::new(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn pay_the_deposit() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order())));
    store.expect_fetch_package().returning(|_| Ok(Some(package())));
    store
        .expect_record_transaction_id()
        .withf(|p, tx| p.order_id.as_str() == ORDER_ID && p.leg == PaymentLeg::Deposit && tx == "tx-dp-1")
        .times(1)
        .returning(|_, _| Ok(true));
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().times(1).returning(|req| {
        assert_eq!(req.merchant_order_id, format!("{ORDER_ID}_dp"));
        assert_eq!(req.amount.value(), 3_000_000);
        assert_eq!(req.customer_email, "ayu@example.com");
        assert!(req.item_name.starts_with("Gold Package"));
        Ok(session("tx-dp-1"))
    });
    let req = pay_request("/payment/create");
    let (status, body) = send_request(req, Some(&user_token()), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["transaction_id"], "tx-dp-1");
    assert_eq!(body["redirect_url"], "https://app.sandbox.midtrans.com/snap/v4/redirection/tx-dp-1");
}

#[actix_web::test]
async fn balance_before_the_deposit_is_paid() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order())));
    let req = pay_request("/payment/final");
    let (status, body) = send_request(req, Some(&user_token()), configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"The deposit has not been paid yet, so the balance cannot be paid"}"#);
}

#[actix_web::test]
async fn pay_the_balance() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(deposit_paid_order())));
    store.expect_fetch_package().returning(|_| Ok(Some(package())));
    store
        .expect_record_transaction_id()
        .withf(|p, tx| p.leg == PaymentLeg::Balance && p.attempt == 1 && tx == "tx-final-1")
        .times(1)
        .returning(|_, _| Ok(true));
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().times(1).returning(|req| {
        assert_eq!(req.merchant_order_id, format!("{ORDER_ID}_final"));
        assert_eq!(req.amount.value(), 7_000_000);
        Ok(session("tx-final-1"))
    });
    let req = pay_request("/payment/final");
    let (status, body) = send_request(req, Some(&user_token()), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["transaction_id"], "tx-final-1");
}

#[actix_web::test]
async fn retrying_a_failed_balance_opens_a_new_attempt() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| {
        let mut o = deposit_paid_order();
        o.final_status = LegStatus::Failed;
        o.final_attempt = 1;
        Ok(Some(o))
    });
    store.expect_fetch_package().returning(|_| Ok(Some(package())));
    store
        .expect_record_transaction_id()
        .withf(|p, tx| p.leg == PaymentLeg::Balance && p.attempt == 2 && tx == "tx-final-2")
        .times(1)
        .returning(|_, _| Ok(true));
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().times(1).returning(|req| {
        assert_eq!(req.merchant_order_id, format!("{ORDER_ID}_final-2"));
        assert_eq!(req.amount.value(), 7_000_000);
        Ok(session("tx-final-2"))
    });
    let req = pay_request("/payment/final");
    let (status, body) = send_request(req, Some(&user_token()), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["transaction_id"], "tx-final-2");
}

#[actix_web::test]
async fn balance_cannot_be_paid_twice() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| {
        let mut o = deposit_paid_order();
        o.final_status = LegStatus::Paid;
        o.status = OrderStatusType::Finished;
        Ok(Some(o))
    });
    let req = pay_request("/payment/final");
    let (status, body) = send_request(req, Some(&user_token()), configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"The balance has already been paid"}"#);
}

#[actix_web::test]
async fn cannot_pay_for_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| {
        let mut o = order();
        o.user_id = UserId::from(OTHER_USER_ID);
        Ok(Some(o))
    });
    let req = pay_request("/payment/create");
    let (status, _) = send_request(req, Some(&user_token()), configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn order_id_is_required() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/payment/create").set_json(json!({}));
    let configure = configure(MockBookingStore::new(), MockGateway::new());
    let (status, body) = send_request(req, Some(&user_token()), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"orderId is required"}"#);
}

#[actix_web::test]
async fn gateway_rejections_are_passed_on() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order())));
    store.expect_fetch_package().returning(|_| Ok(Some(package())));
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().returning(|_| {
        Err(GatewayError::Upstream {
            status: 401,
            body: r#"{"error_messages":["Access denied due to unauthorized transaction"]}"#.into(),
        })
    });
    let req = pay_request("/payment/create");
    let (status, body) = send_request(req, Some(&user_token()), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body = json_body(&body);
    assert_eq!(body["gateway_response"]["error_messages"][0], "Access denied due to unauthorized transaction");
}

#[actix_web::test]
async fn gateway_outages_are_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order())));
    store.expect_fetch_package().returning(|_| Ok(Some(package())));
    let mut gateway = MockGateway::new();
    gateway.expect_create_transaction().returning(|_| Err(GatewayError::Unavailable("connection refused".into())));
    let req = pay_request("/payment/create");
    let (status, _) = send_request(req, Some(&user_token()), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
