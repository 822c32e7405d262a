use actix_web::{
    body::{to_bytes, BoxBody},
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
    HttpResponse,
};
use booking_engine::db_types::{
    LegStatus,
    Order,
    OrderId,
    OrderStatusType,
    Package,
    PackageId,
    PackageItem,
    PackageRecord,
    Role,
    Rupiah,
    UserId,
};
use chrono::{NaiveDate, TimeZone, Utc};
use dbk_common::Secret;
use log::debug;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::{AuthConfig, ServerOptions},
    routes::json_config,
};

// Used to sign tokens in tests only. DO NOT re-use this key anywhere.
const TEST_JWT_SECRET: &str = "endpoint-tests-only-5f0c2a9e61d84b7f93ce";
pub const TEST_SERVER_KEY: &str = "SB-Mid-server-endpoint-tests";
pub const USER_ID: &str = "5b1f4a0e9d2c4e7f8a6b3c2d1e0f9a8b";
pub const OTHER_USER_ID: &str = "0e9d8c7b6a5f4e3d2c1b0a9f8e7d6c5b";
pub const ORDER_ID: &str = "c0ffee00c0ffee00c0ffee00c0ffee00";
pub const PACKAGE_ID: &str = "9a8b7c6d5e4f3a2b1c0d9e8f7a6b5c4d";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn server_options() -> ServerOptions {
    ServerOptions { midtrans_server_key: Secret::new(TEST_SERVER_KEY.to_string()), ..ServerOptions::default() }
}

pub fn claims(role: Role) -> JwtClaims {
    JwtClaims { sub: UserId::from(USER_ID), email: "ayu@example.com".into(), name: "Ayu Lestari".into(), role }
}

pub fn issue_token(claims: JwtClaims) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(claims).expect("Failed to sign token")
}

pub fn user_token() -> String {
    issue_token(claims(Role::User))
}

pub fn admin_token() -> String {
    issue_token(claims(Role::Admin))
}

/// Runs a single request against an app holding the routes and data that `configure` registers, plus the token
/// issuer and server options every handler expects. Errors are rendered into responses the way the server does.
pub async fn call_app<F>(req: TestRequest, token: Option<&str>, configure: F) -> HttpResponse<BoxBody>
where F: FnOnce(&mut ServiceConfig) {
    let req = match token {
        Some(t) => req.insert_header(("Authorization", format!("Bearer {t}"))),
        None => req,
    };
    let app = App::new()
        .app_data(json_config())
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
        .app_data(web::Data::new(server_options()))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("🚀️ Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    }
}

pub async fn send_request<F>(req: TestRequest, token: Option<&str>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let res = call_app(req, token, configure).await;
    let status = res.status();
    let bytes = to_bytes(res.into_body()).await.expect("Could not read response body");
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub fn json_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {body}"))
}

pub fn package() -> Package {
    let package_id = PackageId::from(PACKAGE_ID);
    let item = |id: &str, name: &str, price: i64| PackageItem {
        id: id.to_string(),
        package_id: package_id.clone(),
        name: name.to_string(),
        price: Rupiah::from(price),
    };
    Package {
        package: PackageRecord {
            id: package_id.clone(),
            name: "Gold Package".into(),
            description: Some("Ballroom".into()),
            price: Rupiah::from(10_000_000),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        },
        items: vec![item("item1", "Pelaminan", 6_000_000), item("item2", "Catering", 4_000_000)],
    }
}

/// A fresh 10,000,000 booking for 2025-06-14, owned by `USER_ID`.
pub fn order() -> Order {
    Order {
        id: OrderId::from(ORDER_ID),
        user_id: UserId::from(USER_ID),
        package_id: PackageId::from(PACKAGE_ID),
        schedule_date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
        customer_name: "Ayu Lestari".into(),
        customer_email: "ayu@example.com".into(),
        customer_phone: "08123456789".into(),
        customer_address: "Jl. Melati 5, Bandung".into(),
        total_amount: Rupiah::from(10_000_000),
        dp_amount: Rupiah::from(3_000_000),
        final_amount: Rupiah::from(7_000_000),
        status: OrderStatusType::Pending,
        dp_status: LegStatus::Pending,
        final_status: LegStatus::Pending,
        dp_transaction_id: None,
        final_transaction_id: None,
        final_attempt: 0,
        transaction_status: None,
        fraud_status: None,
        payment_type: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap(),
        dp_paid_at: None,
        final_paid_at: None,
    }
}

pub fn deposit_paid_order() -> Order {
    Order {
        status: OrderStatusType::DpPaid,
        dp_status: LegStatus::Paid,
        dp_paid_at: Some(Utc.with_ymd_and_hms(2024, 5, 3, 9, 0, 0).unwrap()),
        ..order()
    }
}
