//! Startup seeding of reference data from `config.toml`.

use crate::{
    config::settings::AppConfig,
    core::{catalog, credentials::PasswordHasher, status, user},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

/// Counts of rows created by [`seed_from_config`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub statuses: usize,
    pub categories: usize,
    pub users: usize,
}

/// Creates missing statuses, categories and bootstrap users.
///
/// Safe to run on every start; existing rows are never modified. Bootstrap
/// passwords are hashed with `hasher`.
pub async fn seed_from_config(
    db: &DatabaseConnection,
    config: &AppConfig,
    hasher: &dyn PasswordHasher,
) -> Result<SeedSummary> {
    let summary = SeedSummary {
        statuses: status::seed_statuses(db, &config.statuses).await?,
        categories: catalog::seed_categories(db, &config.categories).await?,
        users: user::seed_users(db, hasher, &config.users).await?,
    };

    if status::get_initial_status(db).await.is_err() {
        warn!("No status of kind 'received' exists; order creation will fail");
    }
    info!(
        "Seeding complete: {} status(es), {} category(ies), {} user(s) created",
        summary.statuses, summary.categories, summary.users
    );
    Ok(summary)
}
