use std::fmt::Display;

use booking_engine::db_types::{
    NewPackage,
    NewPackageItem,
    Order,
    OrderId,
    OrderStatusType,
    Package,
    PackageUpdate,
    Rupiah,
    UserId,
    UserProfile,
};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------   Auth  ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub user: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub is_logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

//----------------------------------------------   Schedules  ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleCheckRequest {
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCheckResponse {
    pub is_booked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedDates {
    /// `YYYY-MM-DD`, soonest first.
    pub booked_dates: Vec<String>,
}

//----------------------------------------------   Orders  ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub message: String,
    pub order_id: OrderId,
    pub order: Order,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatusType,
}

//----------------------------------------------   Payments  ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentParams {
    pub order_id: String,
}

impl PaymentParams {
    pub fn order_id(&self) -> Result<OrderId, ServerError> {
        let id = self.order_id.trim();
        if id.is_empty() {
            return Err(ServerError::InvalidInput("orderId is required".into()));
        }
        Ok(OrderId::from(id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub message: String,
    pub redirect_url: String,
    pub transaction_id: String,
}

//----------------------------------------------   Catalog  ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageItemParams {
    pub name: String,
    pub price: Rupiah,
}

impl From<PackageItemParams> for NewPackageItem {
    fn from(p: PackageItemParams) -> Self {
        Self { name: p.name, price: p.price }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPackageParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Rupiah>,
    pub package_items: Vec<PackageItemParams>,
}

impl TryFrom<NewPackageParams> for NewPackage {
    type Error = ServerError;

    fn try_from(p: NewPackageParams) -> Result<Self, Self::Error> {
        let (Some(name), Some(price)) = (p.name, p.price) else {
            return Err(ServerError::InvalidInput("name and price are required".into()));
        };
        let items = p.package_items.into_iter().map(NewPackageItem::from).collect();
        Ok(NewPackage { name, description: p.description, price, items })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePackageParams {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Rupiah>,
    pub package_items: Option<Vec<PackageItemParams>>,
}

impl UpdatePackageParams {
    pub fn into_update(self) -> Result<(String, PackageUpdate), ServerError> {
        let id = self
            .id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ServerError::InvalidInput("id is required".into()))?;
        let update = PackageUpdate {
            name: self.name,
            description: self.description,
            price: self.price,
            items: self.package_items.map(|items| items.into_iter().map(NewPackageItem::from).collect()),
        };
        Ok((id, update))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageIdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageResponse {
    pub message: String,
    pub package: Package,
}
