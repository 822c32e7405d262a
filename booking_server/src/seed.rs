//! Start-up data: the default package catalog, and promotion of the configured admin accounts.
use booking_engine::{
    db_types::{NewPackage, NewPackageItem, Role, Rupiah},
    traits::{AccountManagement, CatalogManagement},
    AccountApi,
    CatalogApi,
};
use log::*;

use crate::errors::ServerError;

fn item(name: &str, price: i64) -> NewPackageItem {
    NewPackageItem { name: name.to_string(), price: Rupiah::from(price) }
}

pub fn default_packages() -> Vec<NewPackage> {
    vec![
        NewPackage {
            name: "Bronze Package".into(),
            description: Some("Paket ekonomis untuk acara intim dan minimalis.".into()),
            price: Rupiah::from(20_000_000),
            items: vec![
                item("Dekorasi Pelaminan 4m", 10_000_000),
                item("Makeup & Busana", 5_000_000),
                item("Dokumentasi (1 Fotografer)", 5_000_000),
            ],
        },
        NewPackage {
            name: "Silver Package".into(),
            description: Some("Paket lengkap untuk acara menengah dengan fasilitas premium.".into()),
            price: Rupiah::from(150_000_000),
            items: vec![
                item("Dekorasi Pelaminan 8m & Fresh Flower", 60_000_000),
                item("Catering 500 Pax", 50_000_000),
                item("Tenda & Alat Pesta Pro", 25_000_000),
                item("Sound System & Entertainment", 15_000_000),
            ],
        },
        NewPackage {
            name: "Gold Package".into(),
            description: Some("Paket Luxury eksklusif untuk acara megah di Ballroom.".into()),
            price: Rupiah::from(500_000_000),
            items: vec![
                item("Sewa Ballroom Hotel Bintang 5", 200_000_000),
                item("Catering 1000 Pax Luxury Menu", 150_000_000),
                item("Dekorasi Full Area & Lighting", 100_000_000),
                item("Bintang Tamu / Artis", 50_000_000),
            ],
        },
    ]
}

/// Adds the default packages, but only if the catalog is empty. Returns the number of packages added.
pub async fn seed_catalog<B: CatalogManagement>(api: &CatalogApi<B>) -> Result<usize, ServerError> {
    if !api.packages().await?.is_empty() {
        debug!("📦️ The catalog already has packages. Skipping the seed.");
        return Ok(0);
    }
    let packages = default_packages();
    let count = packages.len();
    for package in packages {
        let package = api.create_package(package).await?;
        info!("📦️ Seeded package {} ({})", package.package.name, package.package.price);
    }
    Ok(count)
}

/// Gives the admin role to every existing account in `emails`. Emails without an account are skipped with a warning.
pub async fn promote_admins<B: AccountManagement>(api: &AccountApi<B>, emails: &[String]) -> Result<(), ServerError> {
    for email in emails {
        if api.assign_role(email, Role::Admin).await? {
            info!("🔐️ {email} has the admin role");
        } else {
            warn!("🔐️ {email} is listed in DBK_ADMIN_EMAILS, but has no account. Register it and restart the server.");
        }
    }
    Ok(())
}
