use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use booking_engine::{
    db_types::{Package, PackageId, PackageItem, PackageRecord},
    traits::CatalogError,
    CatalogApi,
};
use chrono::Utc;
use serde_json::json;

use super::{
    helpers::{admin_token, json_body, package, send_request, user_token, PACKAGE_ID},
    mocks::MockBookingStore,
};
use crate::routes::{
    AdminCreatePackageRoute,
    AdminDeletePackageRoute,
    AdminPackagesRoute,
    AdminUpdatePackageRoute,
    PackageByIdRoute,
    PackagesRoute,
};

fn configure(store: MockBookingStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(PackagesRoute::<MockBookingStore>::new())
            .service(PackageByIdRoute::<MockBookingStore>::new())
            .service(AdminPackagesRoute::<MockBookingStore>::new())
            .service(AdminCreatePackageRoute::<MockBookingStore>::new())
            .service(AdminUpdatePackageRoute::<MockBookingStore>::new())
            .service(AdminDeletePackageRoute::<MockBookingStore>::new())
            .app_data(web::Data::new(CatalogApi::new(store)));
    }
}

#[actix_web::test]
async fn packages_are_public() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_packages().returning(|| Ok(vec![package()]));
    let (status, body) = send_request(TestRequest::get().uri("/packages"), None, configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body[0]["id"], PACKAGE_ID);
    assert_eq!(body[0]["name"], "Gold Package");
    assert_eq!(body[0]["price"], 10_000_000);
    assert_eq!(body[0]["items"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn fetch_missing_package() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_fetch_package().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/packages/nope");
    let (status, body) = send_request(req, None, configure(store)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Package nope does not exist"}"#);
}

#[actix_web::test]
async fn admin_routes_need_a_session() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/admin/packages");
    let (status, _) = send_request(req, None, configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_routes_are_forbidden_for_users() {
    let _ = env_logger::try_init().ok();
    let token = user_token();
    let req = TestRequest::post().uri("/admin/packages").set_json(json!({ "name": "Platinum", "price": 900000000 }));
    let (status, body) = send_request(req, Some(&token), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Authentication Error. Insufficient Permissions. Requires ADMIN"}"#);
    let req = TestRequest::delete().uri("/admin/packages?id=abc");
    let (status, _) = send_request(req, Some(&token), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_fetches_one_package_by_query() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store
        .expect_fetch_package()
        .withf(|id| id.as_str() == PACKAGE_ID)
        .returning(|_| Ok(Some(package())));
    let req = TestRequest::get().uri(&format!("/admin/packages?id={PACKAGE_ID}"));
    let (status, body) = send_request(req, Some(&admin_token()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["id"], PACKAGE_ID);
}

#[actix_web::test]
async fn admin_creates_a_package() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_insert_package().times(1).returning(|p| {
        let id = PackageId::from("new-package");
        let items = p
            .items
            .into_iter()
            .enumerate()
            .map(|(i, item)| PackageItem {
                id: format!("item{i}"),
                package_id: id.clone(),
                name: item.name,
                price: item.price,
            })
            .collect();
        let now = Utc::now();
        Ok(Package {
            package: PackageRecord {
                id,
                name: p.name,
                description: p.description,
                price: p.price,
                created_at: now,
                updated_at: now,
            },
            items,
        })
    });
    let req = TestRequest::post().uri("/admin/packages").set_json(json!({
        "name": "Platinum Package",
        "price": 900000000,
        "packageItems": [{ "name": "Ballroom", "price": 500000000 }, { "name": "Catering", "price": 400000000 }]
    }));
    let (status, body) = send_request(req, Some(&admin_token()), configure(store)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let body = json_body(&body);
    assert_eq!(body["package"]["id"], "new-package");
    assert_eq!(body["package"]["items"][1]["name"], "Catering");
}

#[actix_web::test]
async fn create_package_needs_a_price() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/admin/packages").set_json(json!({ "name": "Platinum Package" }));
    let (status, body) = send_request(req, Some(&admin_token()), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"name and price are required"}"#);
}

#[actix_web::test]
async fn update_package_keeps_missing_fields() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_update_package().times(1).returning(|id, update| {
        assert_eq!(id.as_str(), PACKAGE_ID);
        assert!(update.name.is_none());
        assert!(update.items.is_none());
        let mut p = package();
        p.package.price = update.price.unwrap_or(p.package.price);
        Ok(p)
    });
    let req = TestRequest::put().uri("/admin/packages").set_json(json!({ "id": PACKAGE_ID, "price": 12000000 }));
    let (status, body) = send_request(req, Some(&admin_token()), configure(store)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json_body(&body);
    assert_eq!(body["package"]["price"], 12_000_000);
    assert_eq!(body["package"]["name"], "Gold Package");

    let req = TestRequest::put().uri("/admin/packages").set_json(json!({ "price": 12000000 }));
    let (status, body) = send_request(req, Some(&admin_token()), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"id is required"}"#);
}

#[actix_web::test]
async fn booked_packages_cannot_be_deleted() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_delete_package().returning(|id| Err(CatalogError::PackageInUse(id.clone(), 2)));
    let req = TestRequest::delete().uri(&format!("/admin/packages?id={PACKAGE_ID}"));
    let (status, body) = send_request(req, Some(&admin_token()), configure(store)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let expected = format!("Package {PACKAGE_ID} is referenced by 2 order(s) and cannot be deleted");
    assert_eq!(json_body(&body)["error"], expected);
}

#[actix_web::test]
async fn delete_package() {
    let _ = env_logger::try_init().ok();
    let mut store = MockBookingStore::new();
    store.expect_delete_package().times(1).returning(|_| Ok(()));
    let req = TestRequest::delete().uri(&format!("/admin/packages?id={PACKAGE_ID}"));
    let (status, body) = send_request(req, Some(&admin_token()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Package deleted"}"#);

    let req = TestRequest::delete().uri("/admin/packages");
    let (status, body) = send_request(req, Some(&admin_token()), configure(MockBookingStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"id is required"}"#);
}
