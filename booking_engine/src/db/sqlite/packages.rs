use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};
use uuid::Uuid;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewPackage, NewPackageItem, Package, PackageId, PackageItem, PackageRecord, PackageUpdate},
};

pub async fn fetch_package_records(conn: &mut SqliteConnection) -> Result<Vec<PackageRecord>, SqliteDatabaseError> {
    let packages = sqlx::query_as::<_, PackageRecord>("SELECT * FROM packages ORDER BY name ASC, created_at ASC")
        .fetch_all(conn)
        .await?;
    Ok(packages)
}

pub async fn fetch_package_record(
    id: &PackageId,
    conn: &mut SqliteConnection,
) -> Result<Option<PackageRecord>, SqliteDatabaseError> {
    let package = sqlx::query_as::<_, PackageRecord>("SELECT * FROM packages WHERE id = $1")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(package)
}

pub async fn fetch_items(id: &PackageId, conn: &mut SqliteConnection) -> Result<Vec<PackageItem>, SqliteDatabaseError> {
    let items = sqlx::query_as::<_, PackageItem>(
        "SELECT id, package_id, name, price FROM package_items WHERE package_id = $1 ORDER BY position ASC",
    )
    .bind(id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Fetches every package in the catalog, with its items.
pub async fn fetch_packages(conn: &mut SqliteConnection) -> Result<Vec<Package>, SqliteDatabaseError> {
    let records = fetch_package_records(conn).await?;
    let mut packages = Vec::with_capacity(records.len());
    for package in records {
        let items = fetch_items(&package.id, conn).await?;
        packages.push(Package { package, items });
    }
    Ok(packages)
}

pub async fn fetch_package(id: &PackageId, conn: &mut SqliteConnection) -> Result<Option<Package>, SqliteDatabaseError> {
    let Some(package) = fetch_package_record(id, conn).await? else {
        return Ok(None);
    };
    let items = fetch_items(id, conn).await?;
    Ok(Some(Package { package, items }))
}

/// Inserts a package and its items. This is not atomic. Call it from inside a transaction.
pub async fn insert_package(
    package: NewPackage,
    conn: &mut SqliteConnection,
) -> Result<PackageRecord, SqliteDatabaseError> {
    let id = PackageId::random();
    let record = sqlx::query_as::<_, PackageRecord>(
        "INSERT INTO packages (id, name, description, price) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(id.as_str())
    .bind(package.name)
    .bind(package.description)
    .bind(package.price)
    .fetch_one(&mut *conn)
    .await?;
    insert_items(&record.id, package.items, conn).await?;
    debug!("🗃️ Package {} [{}] has been added to the catalog", record.name, record.id);
    Ok(record)
}

async fn insert_items(
    id: &PackageId,
    items: Vec<NewPackageItem>,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("INSERT INTO package_items (id, package_id, name, price, position) ");
    builder.push_values(items.into_iter().enumerate(), |mut b, (pos, item)| {
        b.push_bind(Uuid::new_v4().simple().to_string())
            .push_bind(id.as_str().to_string())
            .push_bind(item.name)
            .push_bind(item.price)
            .push_bind(pos as i64);
    });
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build().execute(conn).await?;
    Ok(())
}

/// Applies a partial update to a package. If the update carries an item list, it replaces the existing one.
/// Returns `None` if the package does not exist. This is not atomic. Call it from inside a transaction.
pub async fn update_package(
    id: &PackageId,
    update: PackageUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<PackageRecord>, SqliteDatabaseError> {
    let PackageUpdate { name, description, price, items } = update;
    let mut builder = QueryBuilder::new("UPDATE packages SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(description) = description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    if let Some(price) = price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    set_clause.push("updated_at = CURRENT_TIMESTAMP");
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str().to_string());
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let Some(record) = builder.build_query_as::<PackageRecord>().fetch_optional(&mut *conn).await? else {
        return Ok(None);
    };
    if let Some(items) = items {
        sqlx::query("DELETE FROM package_items WHERE package_id = $1").bind(id.as_str()).execute(&mut *conn).await?;
        insert_items(id, items, conn).await?;
    }
    Ok(Some(record))
}

/// Deletes a package. Its items go with it. Returns false if there was no such package.
pub async fn delete_package(id: &PackageId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM packages WHERE id = $1").bind(id.as_str()).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_packages(conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM packages").fetch_one(conn).await?;
    Ok(count)
}
