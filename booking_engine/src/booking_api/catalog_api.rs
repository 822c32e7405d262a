//! Read and manage the package catalog.
use std::fmt::Debug;

use log::*;

use crate::{
    booking_api::errors::CatalogApiError,
    db::traits::CatalogManagement,
    db_types::{NewPackage, NewPackageItem, Package, PackageId, PackageUpdate, Rupiah},
    order_lifecycle::MAX_PACKAGE_PRICE,
};

pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn packages(&self) -> Result<Vec<Package>, CatalogApiError> {
        let packages = self.db.fetch_packages().await?;
        Ok(packages)
    }

    pub async fn package(&self, id: &PackageId) -> Result<Package, CatalogApiError> {
        self.db.fetch_package(id).await?.ok_or_else(|| CatalogApiError::PackageNotFound(id.clone()))
    }

    /// Adds a package to the catalog. A package needs a name and a positive price no higher than
    /// [`MAX_PACKAGE_PRICE`].
    pub async fn create_package(&self, package: NewPackage) -> Result<Package, CatalogApiError> {
        let name = package.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogApiError::InvalidInput("name is required".into()));
        }
        check_price(package.price)?;
        check_items(&package.items)?;
        let package = self.db.insert_package(NewPackage { name, ..package }).await?;
        info!("📦️ Package {} [{}] added to the catalog", package.package.name, package.package.id);
        Ok(package)
    }

    /// Updates a package. Fields that are not given keep their values; a given item list replaces the old one.
    pub async fn update_package(&self, id: &PackageId, update: PackageUpdate) -> Result<Package, CatalogApiError> {
        if matches!(&update.name, Some(n) if n.trim().is_empty()) {
            return Err(CatalogApiError::InvalidInput("name cannot be empty".into()));
        }
        if let Some(price) = update.price {
            check_price(price)?;
        }
        if let Some(items) = &update.items {
            check_items(items)?;
        }
        let package = self.db.update_package(id, update).await?;
        info!("📦️ Package {id} updated");
        Ok(package)
    }

    /// Removes a package. Packages that have been booked stay in the catalog.
    pub async fn delete_package(&self, id: &PackageId) -> Result<(), CatalogApiError> {
        self.db.delete_package(id).await?;
        info!("📦️ Package {id} deleted");
        Ok(())
    }
}

fn check_price(price: Rupiah) -> Result<(), CatalogApiError> {
    if !price.is_positive() {
        return Err(CatalogApiError::InvalidInput("price must be greater than zero".into()));
    }
    if price.value() > MAX_PACKAGE_PRICE {
        let max = Rupiah::from(MAX_PACKAGE_PRICE);
        return Err(CatalogApiError::InvalidInput(format!("price cannot be more than {max}")));
    }
    Ok(())
}

fn check_items(items: &[NewPackageItem]) -> Result<(), CatalogApiError> {
    for item in items {
        if item.name.trim().is_empty() {
            return Err(CatalogApiError::InvalidInput("every item needs a name".into()));
        }
        if item.price.value() < 0 {
            return Err(CatalogApiError::InvalidInput(format!("item '{}' has a negative price", item.name)));
        }
    }
    Ok(())
}
