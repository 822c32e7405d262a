//! User registration, login and roles.
use std::fmt::Debug;

use log::*;

use crate::{
    booking_api::errors::AccountApiError,
    db::traits::AccountManagement,
    db_types::{NewUser, Role, UserId, UserProfile},
    helpers::{hash_password, verify_password},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

/// Email addresses are compared case-insensitively.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new customer account. New accounts always get the `USER` role.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<UserProfile, AccountApiError> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AccountApiError::InvalidInput("name, email and password are required".into()));
        }
        let password_hash = hash_password(password)?;
        let user = NewUser { id: UserId::random(), name: name.to_string(), email, password_hash, role: Role::User };
        let account = self.db.insert_user(user).await?;
        info!("🔐️ New account {} registered for {}", account.id, account.email);
        Ok(account.into())
    }

    /// Checks a login attempt. An unknown email and a wrong password give the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AccountApiError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AccountApiError::InvalidInput("email and password are required".into()));
        }
        let Some(account) = self.db.fetch_user_by_email(&email).await? else {
            debug!("🔐️ Login attempt for unknown account {email}");
            return Err(AccountApiError::InvalidCredentials);
        };
        if !verify_password(&account.password_hash, password)? {
            debug!("🔐️ Wrong password for {email}");
            return Err(AccountApiError::InvalidCredentials);
        }
        debug!("🔐️ {email} logged in");
        Ok(account.into())
    }

    pub async fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, AccountApiError> {
        let account = self.db.fetch_user_by_id(id).await?;
        Ok(account.map(UserProfile::from))
    }

    /// Gives the account with this email address the given role. Returns `false` if there is no such account.
    pub async fn assign_role(&self, email: &str, role: Role) -> Result<bool, AccountApiError> {
        let email = normalize_email(email);
        let updated = self.db.assign_role(&email, role).await?;
        if updated {
            info!("🔐️ {email} now has the {role} role");
        } else {
            warn!("🔐️ Cannot give {email} the {role} role. There is no such account");
        }
        Ok(updated)
    }
}
