use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewOrder, Order, OrderId, OrderStatusType, OrderSummary, PackageId, PaymentMetadata, StatusSnapshot, UserId},
    order_lifecycle::{MerchantOrderId, OrderStatusUpdate, PaymentLeg},
};

/// Inserts a new order into the database using the given connection. This is not atomic. Embed this call inside a
/// transaction (together with the schedule insert) and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (
                id,
                user_id,
                package_id,
                schedule_date,
                customer_name,
                customer_email,
                customer_phone,
                customer_address,
                total_amount,
                dp_amount,
                final_amount
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.package_id)
    .bind(order.schedule_date)
    .bind(order.customer_name)
    .bind(order.customer_email)
    .bind(order.customer_phone)
    .bind(order.customer_address)
    .bind(order.total_amount)
    .bind(order.dp_amount)
    .bind(order.final_amount)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    user_id: Option<UserId>,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Fetches orders, with their package name, according to the criteria in the `OrderQueryFilter`.
///
/// Resulting orders are sorted newest first.
pub async fn fetch_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderSummary>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(
        "SELECT orders.*, packages.name AS package_name FROM orders JOIN packages ON packages.id = orders.package_id ",
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("orders.user_id = ");
        where_clause.push_bind_unseparated(user_id.0);
    }
    builder.push(" ORDER BY orders.created_at DESC, orders.rowid DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<OrderSummary>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_orders: {}", orders.len());
    Ok(orders)
}

/// Applies a status update to an order, but only if its status fields still match `expected`. Paid-at timestamps are
/// only written if they were previously empty. Returns false if the order was changed by someone else in the meantime
/// (or does not exist).
pub(crate) async fn update_status_if_unchanged(
    id: &OrderId,
    expected: StatusSnapshot,
    update: &OrderStatusUpdate,
    metadata: &PaymentMetadata,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = $1,
            dp_status = $2,
            final_status = $3,
            dp_paid_at = COALESCE(dp_paid_at, $4),
            final_paid_at = COALESCE(final_paid_at, $5),
            transaction_status = COALESCE($6, transaction_status),
            fraud_status = COALESCE($7, fraud_status),
            payment_type = COALESCE($8, payment_type),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $9 AND status = $10 AND dp_status = $11 AND final_status = $12
        "#,
    )
    .bind(update.status)
    .bind(update.dp_status)
    .bind(update.final_status)
    .bind(update.dp_paid_at)
    .bind(update.final_paid_at)
    .bind(metadata.transaction_status.as_deref())
    .bind(metadata.fraud_status.as_deref())
    .bind(metadata.payment_type.as_deref())
    .bind(id.as_str())
    .bind(expected.status)
    .bind(expected.dp_status)
    .bind(expected.final_status)
    .execute(conn)
    .await?;
    let applied = result.rows_affected() == 1;
    debug!("🗃️ Conditional status update for order {id}: applied = {applied}");
    Ok(applied)
}

/// Changes the overall status of an order if it is still `expected`. Returns false if it was not.
pub(crate) async fn set_status_if(
    id: &OrderId,
    expected: OrderStatusType,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3",
    )
    .bind(status)
    .bind(id.as_str())
    .bind(expected)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Records the gateway transaction id for a payment leg, guarded by the leg's eligibility rules so that the check
/// and the write happen in one statement:
/// * Deposit: the order is not cancelled and the deposit is not paid.
/// * Balance: the order is not cancelled, the deposit is paid and the balance is not. A previously failed balance
///   attempt goes back to `PENDING`, and the order moves on to the attempt in `payment`. Recording an attempt older
///   than the order's current one is refused.
///
/// Returns false if the guard did not hold.
pub(crate) async fn record_transaction_id(
    payment: &MerchantOrderId,
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let id = &payment.order_id;
    let result = match payment.leg {
        PaymentLeg::Deposit => {
            sqlx::query(
                r#"UPDATE orders SET dp_transaction_id = $1, updated_at = CURRENT_TIMESTAMP
                   WHERE id = $2 AND status <> 'CANCELLED' AND dp_status <> 'PAID'"#,
            )
            .bind(transaction_id)
            .bind(id.as_str())
            .execute(conn)
            .await?
        },
        PaymentLeg::Balance => {
            sqlx::query(
                r#"UPDATE orders SET final_transaction_id = $1, final_status = 'PENDING', final_attempt = $3,
                   updated_at = CURRENT_TIMESTAMP
                   WHERE id = $2 AND status <> 'CANCELLED' AND dp_status = 'PAID' AND final_status <> 'PAID'
                   AND final_attempt <= $3"#,
            )
            .bind(transaction_id)
            .bind(id.as_str())
            .bind(payment.attempt)
            .execute(conn)
            .await?
        },
    };
    let recorded = result.rows_affected() == 1;
    trace!("🗃️ Transaction id {transaction_id} for {payment}: recorded = {recorded}");
    Ok(recorded)
}

pub async fn count_orders_for_package(
    package_id: &PackageId,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE package_id = $1")
        .bind(package_id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count)
}
