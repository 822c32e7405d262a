use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use booking_engine::{
    db_types::{OrderStatusType, OrderSummary, Schedule, UserId},
    events::EventProducers,
    traits::BookingDatabaseError,
    OrderFlowApi,
};
use chrono::{NaiveDate, Utc};
use serde_json::json;

use super::{
    helpers::{
        admin_token,
        deposit_paid_order,
        json_body,
        order,
        package,
        send_request,
        user_token,
        ORDER_ID,
        OTHER_USER_ID,
        PACKAGE_ID,
        USER_ID,
    },
    mocks::MockBookingStore,
};
use crate::routes::{
    AdminOrdersRoute,
    BookedDatesRoute,
    CheckScheduleRoute,
    CreateOrderRoute,
    MyOrdersRoute,
    OrderByIdRoute,
    UpdateOrderStatusRoute,
};

fn configure(store: MockBookingStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(CreateOrderRoute::<MockBookingStore>::new())
            .service(MyOrdersRoute::<MockBookingStore>::new())
            .service(OrderByIdRoute::<MockBookingStore>::new())
            .service(BookedDatesRoute::<MockBookingStore>::new())
            .service(CheckScheduleRoute::<MockBookingStore>::new())
            .service(AdminOrdersRoute::<MockBookingStore>::new())
            .service(UpdateOrderStatusRoute::<MockBookingStore>::new())
            .app_data(web::Data::new(OrderFlowApi::new(store, EventProducers::default())));
    }
}

fn booking() -> serde_json::Value {
    json!({
        "packageId": PACKAGE_ID,
        "customerName": "Ayu Lestari",
        "customerEmail": "ayu@example.com",
        "customerPhone": "08123456789",
        "customerAddress": "Jl. Melati 5, Bandung",
        "scheduleDate": "2025-06-14"
    })
}

fn summaries() -> Vec<OrderSummary> {
    vec![OrderSummary { order: order(), package_name: "Gold Package".into() }]
}

#[actix_web::test]
async fn create_order_needs_a_session() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/orders/create").set_json(booking());
    let (status, body) = send_request(req, None, configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. You are not logged in."}"#);
}

#[actix_web::test]
async fn create_order_splits_the_price() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_package().returning(|_| Ok(Some(package())));
    store.expect_insert_booking().times(1).returning(|new_order| {
        assert_eq!(new_order.user_id.as_str(), USER_ID);
        assert_eq!(new_order.schedule_date, NaiveDate::from_ymd_opt(2025, 6, 14).unwrap());
        assert_eq!(new_order.dp_amount.value(), 3_000_000);
        assert_eq!(new_order.final_amount.value(), 7_000_000);
        Ok(order())
    });
    let req = TestRequest::post().uri("/orders/create").set_json(booking());
    let (status, body) = send_request(req, Some(&user_token()), configure(store)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let body = json_body(&body);
    assert_eq!(body["orderId"], ORDER_ID);
    assert_eq!(body["order"]["status"], "PENDING");
    assert_eq!(body["order"]["dp_status"], "PENDING");
}

#[actix_web::test]
async fn create_order_on_a_booked_date() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_package().returning(|_| Ok(Some(package())));
    store.expect_insert_booking().returning(|o| Err(BookingDatabaseError::ScheduleConflict(o.schedule_date)));
    let req = TestRequest::post().uri("/orders/create").set_json(booking());
    let (status, body) = send_request(req, Some(&user_token()), configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"The date 2025-06-14 is already booked"}"#);
}

#[actix_web::test]
async fn create_order_with_missing_fields() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/orders/create").set_json(json!({ "packageId": PACKAGE_ID }));
    let (status, _) = send_request(req, Some(&user_token()), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn create_order_for_unknown_package() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_package().returning(|_| Ok(None));
    let req = TestRequest::post().uri("/orders/create").set_json(booking());
    let (status, _) = send_request(req, Some(&user_token()), configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store
        .expect_fetch_orders_for_user()
        .withf(|id| id.as_str() == USER_ID)
        .times(1)
        .returning(|_| Ok(summaries()));
    let (status, body) = send_request(TestRequest::get().uri("/orders"), Some(&user_token()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body[0]["id"], ORDER_ID);
    assert_eq!(body[0]["package_name"], "Gold Package");
}

#[actix_web::test]
async fn orders_of_other_users_are_hidden() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| {
        let mut o = order();
        o.user_id = UserId::from(OTHER_USER_ID);
        Ok(Some(o))
    });
    store.expect_fetch_package().returning(|_| Ok(Some(package())));
    let req = TestRequest::get().uri(&format!("/orders/{ORDER_ID}"));
    let (status, _) = send_request(req, Some(&user_token()), configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admins_see_every_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| {
        let mut o = order();
        o.user_id = UserId::from(OTHER_USER_ID);
        Ok(Some(o))
    });
    store.expect_fetch_package().returning(|_| Ok(Some(package())));
    let req = TestRequest::get().uri(&format!("/orders/{ORDER_ID}"));
    let (status, body) = send_request(req, Some(&admin_token()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["user_id"], OTHER_USER_ID);
    assert_eq!(body["package"]["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn booked_dates_are_public() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_schedules().returning(|| {
        let schedule = |id, y, m, d| Schedule {
            id,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            order_id: None,
            created_at: Utc::now(),
        };
        Ok(vec![schedule(2, 2025, 6, 14), schedule(1, 2025, 12, 1)])
    });
    let (status, body) = send_request(TestRequest::get().uri("/schedules/list"), None, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"bookedDates":["2025-06-14","2025-12-01"]}"#);
}

#[actix_web::test]
async fn check_schedule() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store
        .expect_is_date_booked()
        .withf(|d| *d == NaiveDate::from_ymd_opt(2025, 6, 14).unwrap())
        .returning(|_| Ok(true));
    let req = TestRequest::post().uri("/schedules/check").set_json(json!({ "date": "2025-06-14T00:00:00.000Z" }));
    let (status, body) = send_request(req, Some(&user_token()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"isBooked":true}"#);

    let req = TestRequest::post().uri("/schedules/check").set_json(json!({ "date": "14/06/2025" }));
    let (status, _) = send_request(req, Some(&user_token()), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/schedules/check").set_json(json!({}));
    let (status, body) = send_request(req, Some(&user_token()), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"date is required"}"#);
}

#[actix_web::test]
async fn all_orders_are_for_admins() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/admin/orders");
    let (status, _) = send_request(req, Some(&user_token()), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut store = MockBookingStore::new();
    store.expect_fetch_all_orders().times(1).returning(|| Ok(summaries()));
    let req = TestRequest::get().uri("/admin/orders");
    let (status, body) = send_request(req, Some(&admin_token()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body).as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn admin_starts_work_on_an_order() {
    let _ = env_logger::try_init().ok();
    let updated = Arc::new(AtomicBool::new(false));
    let mut store = MockBookingStore::new();
    let flag = updated.clone();
    store.expect_fetch_order().returning(move |_| {
        let mut o = deposit_paid_order();
        if flag.load(Ordering::SeqCst) {
            o.status = OrderStatusType::InProgress;
        }
        Ok(Some(o))
    });
    let flag = updated.clone();
    store
        .expect_set_order_status_if()
        .withf(|_, from, to| *from == OrderStatusType::DpPaid && *to == OrderStatusType::InProgress)
        .times(1)
        .returning(move |_, _, _| {
            flag.store(true, Ordering::SeqCst);
            Ok(true)
        });
    let req = TestRequest::patch().uri(&format!("/admin/orders/{ORDER_ID}/status")).set_json(json!({
        "status": "IN_PROGRESS"
    }));
    let (status, body) = send_request(req, Some(&admin_token()), configure(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json_body(&body)["status"], "IN_PROGRESS");
}

#[actix_web::test]
async fn forbidden_status_changes() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_order().returning(|_| Ok(Some(order())));
    let req = TestRequest::patch().uri(&format!("/admin/orders/{ORDER_ID}/status")).set_json(json!({
        "status": "COMPLETED"
    }));
    let (status, body) = send_request(req, Some(&admin_token()), configure(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"An order cannot be changed from PENDING to COMPLETED"}"#);

    let req = TestRequest::patch().uri(&format!("/admin/orders/{ORDER_ID}/status")).set_json(json!({
        "status": "ON_HOLD"
    }));
    let (status, _) = send_request(req, Some(&admin_token()), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
