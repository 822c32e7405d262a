use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use booking_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    AccountApi,
    CatalogApi,
    OrderFlowApi,
    PaymentApi,
    SqliteDatabase,
};
use log::*;
use midtrans_tools::MidtransApi;

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::midtrans::MidtransProvider,
    routes::{
        auth_status,
        health,
        json_config,
        logout,
        AdminCreatePackageRoute,
        AdminDeletePackageRoute,
        AdminOrdersRoute,
        AdminPackagesRoute,
        AdminUpdatePackageRoute,
        BookedDatesRoute,
        CheckScheduleRoute,
        CreateBalancePaymentRoute,
        CreateDepositPaymentRoute,
        CreateOrderRoute,
        LoginRoute,
        MeRoute,
        MidtransNotificationRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PackageByIdRoute,
        PackagesRoute,
        RegisterRoute,
        UpdateOrderStatusRoute,
    },
    seed::{promote_admins, seed_catalog},
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.seed_catalog {
        let added = seed_catalog(&CatalogApi::new(db.clone())).await?;
        info!("📦️ {added} packages were added to the catalog");
    }
    promote_admins(&AccountApi::new(db.clone()), &config.admin_emails).await?;

    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, logging_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Order events are written to the log. This is the place to hook up e-mail or chat notifications.
fn logging_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_created(|ev| {
        Box::pin(async move {
            info!(
                "📬️ New booking {} for {} on {}",
                ev.order.id, ev.order.customer_name, ev.order.schedule_date
            );
        })
    });
    hooks.on_order_status_changed(|ev| {
        Box::pin(async move {
            let (old, new) = (&ev.old_order, &ev.new_order);
            info!(
                "📬️ Order {} is now {} (was {}). Deposit: {}. Balance: {}.",
                new.id, new.status, old.status, new.dp_status, new.final_status
            );
            if ev.deposit_paid() {
                info!("📬️ The deposit for order {} has been paid. The date {} is locked in.", new.id, new.schedule_date);
            }
        })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let midtrans = MidtransApi::new(config.midtrans.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let payments_api = PaymentApi::new(db.clone(), MidtransProvider::new(midtrans.clone()));
        let catalog_api = CatalogApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let api_scope = web::scope("/api")
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(logout)
            .service(auth_status)
            .service(MeRoute::new())
            .service(PackagesRoute::<SqliteDatabase>::new())
            .service(PackageByIdRoute::<SqliteDatabase>::new())
            .service(BookedDatesRoute::<SqliteDatabase>::new())
            .service(CheckScheduleRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(CreateDepositPaymentRoute::<SqliteDatabase, MidtransProvider>::new())
            .service(CreateBalancePaymentRoute::<SqliteDatabase, MidtransProvider>::new())
            .service(MidtransNotificationRoute::<SqliteDatabase>::new())
            .service(AdminPackagesRoute::<SqliteDatabase>::new())
            .service(AdminCreatePackageRoute::<SqliteDatabase>::new())
            .service(AdminUpdatePackageRoute::<SqliteDatabase>::new())
            .service(AdminDeletePackageRoute::<SqliteDatabase>::new())
            .service(AdminOrdersRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("dbk::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options.clone()))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
