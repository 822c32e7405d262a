use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewUser, Role, UserAccount, UserId},
};

/// Creates a new user account. A second account with the same email address is rejected with
/// [`SqliteDatabaseError::DuplicateEmail`].
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<UserAccount, SqliteDatabaseError> {
    let email = user.email.clone();
    let result = sqlx::query_as::<_, UserAccount>(
        r#"INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, email, password_hash, role, created_at"#,
    )
    .bind(user.id)
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role)
    .fetch_one(conn)
    .await;
    match result {
        Ok(account) => {
            debug!("🗃️ User account {} created for {}", account.id, account.email);
            Ok(account)
        },
        Err(e) => {
            let err = SqliteDatabaseError::from(e);
            if err.is_unique_violation() {
                Err(SqliteDatabaseError::DuplicateEmail(email))
            } else {
                Err(err)
            }
        },
    }
}

pub async fn fetch_user_by_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, SqliteDatabaseError> {
    let user = sqlx::query_as::<_, UserAccount>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_user_by_id(
    id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, SqliteDatabaseError> {
    let user =
        sqlx::query_as::<_, UserAccount>("SELECT * FROM users WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(user)
}

/// Sets the role of the account with the given email. Returns false if there is no such account.
pub async fn assign_role(email: &str, role: Role, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE users SET role = $1 WHERE email = $2").bind(role).bind(email).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
