use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
pub use dbk_common::Rupiah;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

/// Declares a string-backed identifier. New ids are random v4 UUIDs in their 32-character hex form.
macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn random() -> Self {
                Self(uuid::Uuid::new_v4().simple().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if s.is_empty() {
                    Err(ConversionError(format!("{} cannot be empty", stringify!($name))))
                } else {
                    Ok(Self(s.to_string()))
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(OrderId);
string_id!(UserId);
string_id!(PackageId);

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Can manage the package catalog and see every order.
    Admin,
    #[default]
    User,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::User => write!(f, "USER"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "USER" => Ok(Self::User),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The booking exists and the date is reserved, but no deposit has been received.
    #[default]
    Pending,
    /// The deposit has been paid.
    DpPaid,
    /// Preparations for the event have started.
    InProgress,
    /// The balance has been paid.
    Finished,
    /// The event has taken place and the order is closed.
    Completed,
    /// The deposit failed, or the booking was cancelled by an admin.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::DpPaid => "DP_PAID",
            Self::InProgress => "IN_PROGRESS",
            Self::Finished => "FINISHED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "DP_PAID" => Ok(Self::DpPaid),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "FINISHED" => Ok(Self::Finished),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------      LegStatus        ---------------------------------------------------------
/// The status of one payment leg (deposit or balance) of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl LegStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Failed)
    }
}

impl Display for LegStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Paid => write!(f, "PAID"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for LegStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub package_id: PackageId,
    pub schedule_date: NaiveDate,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub total_amount: Rupiah,
    pub dp_amount: Rupiah,
    pub final_amount: Rupiah,
    pub status: OrderStatusType,
    pub dp_status: LegStatus,
    pub final_status: LegStatus,
    pub dp_transaction_id: Option<String>,
    pub final_transaction_id: Option<String>,
    /// The balance attempt the order is on. 0 until a balance payment is first opened.
    pub final_attempt: i64,
    pub transaction_status: Option<String>,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub dp_paid_at: Option<DateTime<Utc>>,
    pub final_paid_at: Option<DateTime<Utc>>,
}

/// The three status fields of an order. Conditional updates use this as the "expected current state".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: OrderStatusType,
    pub dp_status: LegStatus,
    pub final_status: LegStatus,
}

impl Order {
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot { status: self.status, dp_status: self.dp_status, final_status: self.final_status }
    }
}

/// The gateway's own description of the last transaction it reported, kept on the order for support purposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub transaction_status: Option<String>,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
}

/// A validated booking, ready to be stored. Amounts are derived from the package price, never from client input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub package_id: PackageId,
    pub schedule_date: NaiveDate,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub total_amount: Rupiah,
    pub dp_amount: Rupiah,
    pub final_amount: Rupiah,
}

/// An order together with the name of the booked package, as shown in order listings.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub package_name: String,
}

//--------------------------------------       Packages        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PackageItem {
    pub id: String,
    pub package_id: PackageId,
    pub name: String,
    pub price: Rupiah,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: PackageId,
    pub name: String,
    pub description: Option<String>,
    pub price: Rupiah,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog package with its items, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    #[serde(flatten)]
    pub package: PackageRecord,
    pub items: Vec<PackageItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPackageItem {
    pub name: String,
    pub price: Rupiah,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPackage {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Rupiah,
    #[serde(default)]
    pub items: Vec<NewPackageItem>,
}

/// Fields that are `None` keep their stored value. When `items` is present, the whole item list is replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Rupiah>,
    pub items: Option<Vec<NewPackageItem>>,
}

impl PackageUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none() && self.items.is_none()
    }
}

//--------------------------------------         Users         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// The public view of a user account. The password hash never leaves the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<UserAccount> for UserProfile {
    fn from(u: UserAccount) -> Self {
        Self { id: u.id, name: u.name, email: u.email, role: u.role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

//--------------------------------------       Schedules       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub date: NaiveDate,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}
