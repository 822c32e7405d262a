//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution.
use actix_web::{get, post, web, HttpResponse, Responder};
use booking_engine::{
    db_types::{NewPackage, OrderId, PackageId, Role},
    order_objects::BookingRequest,
    traits::{AccountManagement, BookingDatabase, CatalogManagement},
    AccountApi,
    CatalogApi,
    OrderFlowApi,
    OrderFlowError,
    PaymentApi,
    PaymentProvider,
};
use log::*;
use midtrans_tools::MidtransNotification;
use serde_json::json;

use crate::{
    auth::{removal_cookie, session_cookie, JwtClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::{
        AuthResponse,
        AuthStatus,
        BookedDates,
        JsonResponse,
        LoginRequest,
        NewPackageParams,
        OrderCreatedResponse,
        PackageIdQuery,
        PackageResponse,
        PaymentParams,
        PaymentResponse,
        RegisterRequest,
        ScheduleCheckRequest,
        ScheduleCheckResponse,
        SessionUser,
        StatusUpdateRequest,
        UpdatePackageParams,
    },
    errors::{AuthError, ServerError},
    integrations::midtrans::{to_payment_notification, verify_notification},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    // Routes that also need a payment provider, `P`
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ ; $provider:path where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<A, P>(core::marker::PhantomData<fn() -> (A, P)>);}
        paste::paste! { impl<A, P> [<$name:camel Route>]<A, P> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> (A, P)>)
            }
        }}
        paste::paste! { impl<A, P> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A, P>
        where
            A: $($bounds +)+ 'static,
            P: $provider + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A, P>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Bad JSON bodies get the same `{"error": ...}` treatment as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not read JSON body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl AccountManagement);
/// Creates a user account. New accounts always get the `USER` role.
pub async fn register<A: AccountManagement>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let RegisterRequest { name, email, password } = body.into_inner();
    debug!("💻️ Registration request for {email}");
    let user = api.register(&name, &email, &password).await?;
    let response = AuthResponse { message: "Registration successful".into(), user, token: None };
    Ok(HttpResponse::Created().json(response))
}

route!(login => Post "/auth/login" impl AccountManagement);
/// Checks the user's credentials and issues a session token.
///
/// The token is set in the `auth-token` cookie, and is also returned in the body for clients that would rather send
/// it in an `Authorization: Bearer` header.
pub async fn login<A: AccountManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AccountApi<A>>,
    signer: web::Data<TokenIssuer>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { email, password } = body.into_inner();
    let user = api.login(&email, &password).await?;
    let token = signer.issue_token(JwtClaims::from(user.clone()))?;
    info!("🔐️ {} logged in", user.email);
    let cookie = session_cookie(token.clone(), signer.session_duration(), options.secure_cookies);
    let response = AuthResponse { message: "Login successful".into(), user, token: Some(token) };
    Ok(HttpResponse::Ok().cookie(cookie).json(response))
}

#[post("/auth/logout")]
pub async fn logout(options: web::Data<ServerOptions>) -> impl Responder {
    trace!("💻️ Logout request");
    HttpResponse::Ok().cookie(removal_cookie(options.secure_cookies)).json(JsonResponse::success("Logged out"))
}

/// Never fails: an absent or invalid session just means the caller is not logged in.
#[get("/auth/status")]
pub async fn auth_status(claims: Option<JwtClaims>) -> impl Responder {
    let status = match claims {
        Some(c) => AuthStatus { is_logged_in: true, user: Some(SessionUser { id: c.sub, name: c.name, email: c.email }) },
        None => AuthStatus { is_logged_in: false, user: None },
    };
    HttpResponse::Ok().json(status)
}

route!(me => Get "/auth/me" requires [Role::User]);
pub async fn me(claims: JwtClaims) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET me for {}", claims.email);
    Ok(HttpResponse::Ok().json(json!({ "user": claims })))
}

//----------------------------------------------   Packages  ----------------------------------------------------
route!(packages => Get "/packages" impl CatalogManagement);
pub async fn packages<A: CatalogManagement>(api: web::Data<CatalogApi<A>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET packages");
    let packages = api.packages().await?;
    Ok(HttpResponse::Ok().json(packages))
}

route!(package_by_id => Get "/packages/{id}" impl CatalogManagement);
pub async fn package_by_id<A: CatalogManagement>(
    path: web::Path<String>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = PackageId::from(path.into_inner());
    trace!("💻️ GET package {id}");
    let package = api.package(&id).await?;
    Ok(HttpResponse::Ok().json(package))
}

//----------------------------------------------   Schedules  ----------------------------------------------------
route!(booked_dates => Get "/schedules/list" impl BookingDatabase, CatalogManagement);
/// Every reserved date, as `YYYY-MM-DD`, soonest first.
pub async fn booked_dates<A>(api: web::Data<OrderFlowApi<A>>) -> Result<HttpResponse, ServerError>
where A: BookingDatabase + CatalogManagement {
    trace!("💻️ GET booked dates");
    let dates = api.list_booked_dates().await?;
    let booked_dates = dates.into_iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
    Ok(HttpResponse::Ok().json(BookedDates { booked_dates }))
}

route!(check_schedule => Post "/schedules/check" impl BookingDatabase, CatalogManagement where requires [Role::User]);
pub async fn check_schedule<A>(
    body: web::Json<ScheduleCheckRequest>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: BookingDatabase + CatalogManagement,
{
    let date = body.into_inner().date;
    if date.trim().is_empty() {
        return Err(ServerError::InvalidInput("date is required".into()));
    }
    let is_booked = api.check_schedule(&date).await?;
    Ok(HttpResponse::Ok().json(ScheduleCheckResponse { is_booked }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders/create" impl BookingDatabase, CatalogManagement where requires [Role::User]);
/// Books a package for a date. Responds with 409 Conflict if the date is already taken.
pub async fn create_order<A>(
    claims: JwtClaims,
    body: web::Json<BookingRequest>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: BookingDatabase + CatalogManagement,
{
    debug!("💻️ Booking request from {}", claims.email);
    let order = api.create_order(&claims.sub, body.into_inner()).await?;
    let response = OrderCreatedResponse { message: "Order created".into(), order_id: order.id.clone(), order };
    Ok(HttpResponse::Created().json(response))
}

route!(my_orders => Get "/orders" impl BookingDatabase, CatalogManagement where requires [Role::User]);
/// The caller's orders, newest first.
pub async fn my_orders<A>(claims: JwtClaims, api: web::Data<OrderFlowApi<A>>) -> Result<HttpResponse, ServerError>
where A: BookingDatabase + CatalogManagement {
    debug!("💻️ GET my_orders for {}", claims.email);
    let orders = api.my_orders(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl BookingDatabase, CatalogManagement where requires [Role::User]);
/// An order with its package. Users only see their own orders; admins see everything.
pub async fn order_by_id<A>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: BookingDatabase + CatalogManagement,
{
    let id = OrderId::from(path.into_inner());
    debug!("💻️ GET order {id} for {}", claims.email);
    let order = api.order_by_id(&id, &claims.sub, claims.is_admin()).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_deposit_payment => Post "/payment/create" impl BookingDatabase, CatalogManagement; PaymentProvider where requires [Role::User]);
/// Opens a Midtrans payment page for the 30% deposit of one of the caller's orders.
pub async fn create_deposit_payment<A, P>(
    claims: JwtClaims,
    body: web::Json<PaymentParams>,
    api: web::Data<PaymentApi<A, P>>,
) -> Result<HttpResponse, ServerError>
where
    A: BookingDatabase + CatalogManagement,
    P: PaymentProvider,
{
    let order_id = body.order_id()?;
    debug!("💻️ Deposit payment request for {order_id} from {}", claims.email);
    let session = api.create_deposit_payment(&order_id, &claims.payer()).await?;
    let response = PaymentResponse {
        message: "Deposit payment created".into(),
        redirect_url: session.redirect_url,
        transaction_id: session.transaction_id,
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(create_balance_payment => Post "/payment/final" impl BookingDatabase, CatalogManagement; PaymentProvider where requires [Role::User]);
/// Opens a Midtrans payment page for the 70% balance. Fails with 400 unless the deposit has been paid, and the balance
/// has not.
pub async fn create_balance_payment<A, P>(
    claims: JwtClaims,
    body: web::Json<PaymentParams>,
    api: web::Data<PaymentApi<A, P>>,
) -> Result<HttpResponse, ServerError>
where
    A: BookingDatabase + CatalogManagement,
    P: PaymentProvider,
{
    let order_id = body.order_id()?;
    debug!("💻️ Balance payment request for {order_id} from {}", claims.email);
    let session = api.create_balance_payment(&order_id, &claims.payer()).await?;
    let response = PaymentResponse {
        message: "Balance payment created".into(),
        redirect_url: session.redirect_url,
        transaction_id: session.transaction_id,
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(midtrans_notification => Post "/midtrans/notification" impl BookingDatabase, CatalogManagement);
/// Midtrans HTTP notifications.
///
/// Every authentic, well-formed notification gets a 200 response, including stale and repeated ones, so that Midtrans
/// stops retrying. Notifications that the order flow rejects (e.g. an unknown transaction status) are answered with
/// `success: false`.
pub async fn midtrans_notification<A>(
    body: web::Json<MidtransNotification>,
    api: web::Data<OrderFlowApi<A>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    A: BookingDatabase + CatalogManagement,
{
    let notification = body.into_inner();
    info!("💻️ Midtrans notification for {}: {}", notification.order_id, notification.transaction_status);
    if options.signature_checks && !verify_notification(&notification, options.midtrans_server_key.reveal()) {
        warn!("💻️ Rejecting notification for {} with an invalid signature", notification.order_id);
        return Err(AuthError::InvalidSignature.into());
    }
    match api.process_notification(to_payment_notification(notification)).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(JsonResponse::success(outcome.message()))),
        Err(OrderFlowError::InvalidTransition(e)) => {
            warn!("💻️ Notification was not applied. {e}");
            Ok(HttpResponse::Ok().json(JsonResponse::failure(e)))
        },
        Err(e) => Err(e.into()),
    }
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(admin_packages => Get "/admin/packages" impl CatalogManagement where requires [Role::Admin]);
/// Every package, or just one when `?id=` is given.
pub async fn admin_packages<A: CatalogManagement>(
    query: web::Query<PackageIdQuery>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    match query.into_inner().id {
        Some(id) => {
            let package = api.package(&PackageId::from(id)).await?;
            Ok(HttpResponse::Ok().json(package))
        },
        None => {
            let packages = api.packages().await?;
            Ok(HttpResponse::Ok().json(packages))
        },
    }
}

route!(admin_create_package => Post "/admin/packages" impl CatalogManagement where requires [Role::Admin]);
pub async fn admin_create_package<A: CatalogManagement>(
    body: web::Json<NewPackageParams>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let package = NewPackage::try_from(body.into_inner())?;
    let package = api.create_package(package).await?;
    Ok(HttpResponse::Created().json(PackageResponse { message: "Package created".into(), package }))
}

route!(admin_update_package => Put "/admin/packages" impl CatalogManagement where requires [Role::Admin]);
/// Fields that are left out keep their current values. A `packageItems` list replaces all of the package's items.
pub async fn admin_update_package<A: CatalogManagement>(
    body: web::Json<UpdatePackageParams>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let (id, update) = body.into_inner().into_update()?;
    let package = api.update_package(&PackageId::from(id), update).await?;
    Ok(HttpResponse::Ok().json(PackageResponse { message: "Package updated".into(), package }))
}

route!(admin_delete_package => Delete "/admin/packages" impl CatalogManagement where requires [Role::Admin]);
/// Packages that have been booked cannot be deleted (409 Conflict).
pub async fn admin_delete_package<A: CatalogManagement>(
    query: web::Query<PackageIdQuery>,
    api: web::Data<CatalogApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = query.into_inner().id.ok_or_else(|| ServerError::InvalidInput("id is required".into()))?;
    api.delete_package(&PackageId::from(id)).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Package deleted")))
}

route!(admin_orders => Get "/admin/orders" impl BookingDatabase, CatalogManagement where requires [Role::Admin]);
pub async fn admin_orders<A>(api: web::Data<OrderFlowApi<A>>) -> Result<HttpResponse, ServerError>
where A: BookingDatabase + CatalogManagement {
    debug!("💻️ GET all orders");
    let orders = api.all_orders().await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(update_order_status => Patch "/admin/orders/{id}/status" impl BookingDatabase, CatalogManagement where requires [Role::Admin]);
/// Manual status changes: starting work on a booking, closing it once the event is over, or cancelling it.
pub async fn update_order_status<A>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: BookingDatabase + CatalogManagement,
{
    let id = OrderId::from(path.into_inner());
    let status = body.into_inner().status;
    info!("💻️ {} is changing the status of order {id} to {status}", claims.email);
    let order = api.modify_status_for_order(&id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}
