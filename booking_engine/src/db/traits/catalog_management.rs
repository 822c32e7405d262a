use thiserror::Error;

use crate::db_types::{NewPackage, Package, PackageId, PackageUpdate};

/// Storage for the package catalog. Packages are always returned together with their items.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Every package, ordered by name.
    async fn fetch_packages(&self) -> Result<Vec<Package>, CatalogError>;

    async fn fetch_package(&self, id: &PackageId) -> Result<Option<Package>, CatalogError>;

    /// Stores a new package and its items atomically, and returns the stored package.
    async fn insert_package(&self, package: NewPackage) -> Result<Package, CatalogError>;

    /// Applies a partial update. A present item list replaces the stored one. Fails with
    /// [`CatalogError::PackageNotFound`] if there is no such package.
    async fn update_package(&self, id: &PackageId, update: PackageUpdate) -> Result<Package, CatalogError>;

    /// Deletes a package. A package that has been booked cannot be deleted, and the call fails with
    /// [`CatalogError::PackageInUse`].
    async fn delete_package(&self, id: &PackageId) -> Result<(), CatalogError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Package {0} does not exist")]
    PackageNotFound(PackageId),
    #[error("Package {0} is referenced by {1} order(s) and cannot be deleted")]
    PackageInUse(PackageId, i64),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}
