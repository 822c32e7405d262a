use chrono::NaiveDate;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{OrderId, Schedule},
};

/// Reserves `date` for the given order. The insert is skipped if the date is already taken, in which case `false` is
/// returned. The `UNIQUE(date)` constraint makes this the one place where double bookings are decided, so it is safe
/// under concurrent requests.
pub async fn reserve_date(
    date: NaiveDate,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("INSERT INTO schedules (date, order_id) VALUES ($1, $2) ON CONFLICT(date) DO NOTHING")
        .bind(date)
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    let reserved = result.rows_affected() == 1;
    trace!("🗃️ Reservation of {date} for order {order_id}: {reserved}");
    Ok(reserved)
}

pub async fn is_date_booked(date: NaiveDate, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let booked = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM schedules WHERE date = $1)")
        .bind(date)
        .fetch_one(conn)
        .await?;
    Ok(booked)
}

/// All reserved dates, soonest first.
pub async fn fetch_schedules(conn: &mut SqliteConnection) -> Result<Vec<Schedule>, SqliteDatabaseError> {
    let schedules = sqlx::query_as::<_, Schedule>("SELECT * FROM schedules ORDER BY date ASC").fetch_all(conn).await?;
    Ok(schedules)
}
