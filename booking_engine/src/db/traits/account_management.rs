use thiserror::Error;

use crate::db_types::{NewUser, Role, UserAccount, UserId};

/// Storage for user accounts. Email addresses are unique across all accounts.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Creates a new account. Fails with [`AccountManagementError::DuplicateEmail`] if the email address is taken.
    async fn insert_user(&self, user: NewUser) -> Result<UserAccount, AccountManagementError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountManagementError>;

    async fn fetch_user_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, AccountManagementError>;

    /// Sets the role for the account with the given email address. Returns `false` if there is no such account.
    async fn assign_role(&self, email: &str, role: Role) -> Result<bool, AccountManagementError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccountManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("An account for {0} already exists")]
    DuplicateEmail(String),
}

impl From<sqlx::Error> for AccountManagementError {
    fn from(e: sqlx::Error) -> Self {
        AccountManagementError::DatabaseError(e.to_string())
    }
}
