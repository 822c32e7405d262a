//! `SqliteDatabase` is the SQLite implementation of the booking engine's storage traits.
use std::fmt::Debug;

use chrono::NaiveDate;
use log::*;
use sqlx::SqlitePool;

use super::{db_url, new_pool, orders, packages, schedules, users, SqliteDatabaseError};
use crate::{
    db::{
        sqlite::orders::OrderQueryFilter,
        traits::{
            AccountManagement,
            AccountManagementError,
            BookingDatabase,
            BookingDatabaseError,
            CatalogError,
            CatalogManagement,
        },
    },
    db_types::{
        NewOrder,
        NewPackage,
        NewUser,
        Order,
        OrderId,
        OrderStatusType,
        OrderSummary,
        Package,
        PackageId,
        PackageUpdate,
        PaymentMetadata,
        Role,
        Schedule,
        StatusSnapshot,
        UserAccount,
        UserId,
    },
    order_lifecycle::{MerchantOrderId, OrderStatusUpdate},
};

const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl BookingDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_booking(&self, order: NewOrder) -> Result<Order, BookingDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let date = order.schedule_date;
        let order = orders::insert_order(order, &mut tx).await?;
        if !schedules::reserve_date(date, &order.id, &mut tx).await? {
            debug!("🗃️ {date} is already booked. Order {} will not be saved", order.id);
            tx.rollback().await?;
            return Err(BookingDatabaseError::ScheduleConflict(date));
        }
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved and {date} is reserved", order.id);
        Ok(order)
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, BookingDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<OrderSummary>, BookingDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let query = OrderQueryFilter::default().with_user_id(user_id.clone());
        let orders = orders::fetch_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<OrderSummary>, BookingDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders(OrderQueryFilter::default(), &mut conn).await?;
        Ok(orders)
    }

    async fn is_date_booked(&self, date: NaiveDate) -> Result<bool, BookingDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let booked = schedules::is_date_booked(date, &mut conn).await?;
        Ok(booked)
    }

    async fn fetch_schedules(&self) -> Result<Vec<Schedule>, BookingDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let schedules = schedules::fetch_schedules(&mut conn).await?;
        Ok(schedules)
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        expected: StatusSnapshot,
        update: &OrderStatusUpdate,
        metadata: &PaymentMetadata,
    ) -> Result<bool, BookingDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let applied = orders::update_status_if_unchanged(id, expected, update, metadata, &mut conn).await?;
        Ok(applied)
    }

    async fn set_order_status_if(
        &self,
        id: &OrderId,
        expected: OrderStatusType,
        status: OrderStatusType,
    ) -> Result<bool, BookingDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let changed = orders::set_status_if(id, expected, status, &mut conn).await?;
        if changed {
            info!("🗃️ Order {id} status changed from {expected} to {status}");
        }
        Ok(changed)
    }

    async fn record_transaction_id(
        &self,
        payment: &MerchantOrderId,
        transaction_id: &str,
    ) -> Result<bool, BookingDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let recorded = orders::record_transaction_id(payment, transaction_id, &mut conn).await?;
        Ok(recorded)
    }

    async fn close(&mut self) -> Result<(), BookingDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_packages(&self) -> Result<Vec<Package>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let packages = packages::fetch_packages(&mut conn).await?;
        Ok(packages)
    }

    async fn fetch_package(&self, id: &PackageId) -> Result<Option<Package>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let package = packages::fetch_package(id, &mut conn).await?;
        Ok(package)
    }

    async fn insert_package(&self, package: NewPackage) -> Result<Package, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let record = packages::insert_package(package, &mut tx).await?;
        let items = packages::fetch_items(&record.id, &mut tx).await?;
        tx.commit().await?;
        Ok(Package { package: record, items })
    }

    async fn update_package(&self, id: &PackageId, update: PackageUpdate) -> Result<Package, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let record = packages::update_package(id, update, &mut tx)
            .await?
            .ok_or_else(|| CatalogError::PackageNotFound(id.clone()))?;
        let items = packages::fetch_items(id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Package {id} has been updated");
        Ok(Package { package: record, items })
    }

    async fn delete_package(&self, id: &PackageId) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;
        let count = orders::count_orders_for_package(id, &mut tx).await?;
        if count > 0 {
            return Err(SqliteDatabaseError::PackageInUse(id.clone(), count).into());
        }
        if !packages::delete_package(id, &mut tx).await? {
            return Err(SqliteDatabaseError::PackageNotFound(id.clone()).into());
        }
        tx.commit().await?;
        info!("🗃️ Package {id} has been removed from the catalog");
        Ok(())
    }
}

impl AccountManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<UserAccount, AccountManagementError> {
        let mut conn = self.pool.acquire().await?;
        let account = users::insert_user(user, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountManagementError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_email(email, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, AccountManagementError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(id, &mut conn).await?;
        Ok(user)
    }

    async fn assign_role(&self, email: &str, role: Role) -> Result<bool, AccountManagementError> {
        let mut conn = self.pool.acquire().await?;
        let updated = users::assign_role(email, role, &mut conn).await?;
        Ok(updated)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `DBK_DATABASE_URL` for the connection string.
    pub async fn new() -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The number of packages in the catalog.
    pub async fn count_packages(&self) -> Result<i64, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        packages::count_packages(&mut conn).await
    }
}
