//! Order status business logic - lookup and seeding of order statuses.
//!
//! Statuses live in the database so their display names can be localized, but
//! the workflow keys off [`StatusKind`]. Seeding is idempotent: existing rows
//! (matched by name) are left untouched.

use crate::{
    config::settings::StatusConfig,
    entities::{OrderStatus, StatusKind, order_status},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Retrieves every configured status, ordered by id (seed order).
pub async fn get_all_statuses(db: &DatabaseConnection) -> Result<Vec<order_status::Model>> {
    OrderStatus::find()
        .order_by_asc(order_status::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a status by its unique ID.
pub async fn get_status_by_id<C>(db: &C, status_id: i64) -> Result<Option<order_status::Model>>
where
    C: ConnectionTrait,
{
    OrderStatus::find_by_id(status_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves the status new orders start in.
///
/// A missing initial status means the seed data is broken, which is reported
/// as [`Error::InternalInvariantViolation`].
pub async fn get_initial_status<C>(db: &C) -> Result<order_status::Model>
where
    C: ConnectionTrait,
{
    OrderStatus::find()
        .filter(order_status::Column::Kind.eq(StatusKind::Received))
        .order_by_asc(order_status::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| Error::InternalInvariantViolation {
            message: "No initial order status is configured".to_string(),
        })
}

/// Creates a single status row.
pub async fn create_status(
    db: &DatabaseConnection,
    name: &str,
    kind: StatusKind,
    description: Option<String>,
    terminal: bool,
) -> Result<order_status::Model> {
    if name.trim().is_empty() {
        return Err(Error::invalid_input("Status name cannot be empty"));
    }

    order_status::ActiveModel {
        nombre: Set(name.trim().to_string()),
        descripcion: Set(description),
        kind: Set(kind),
        es_final: Set(terminal),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts the configured statuses that do not exist yet.
///
/// Returns the number of statuses created.
#[instrument(skip(db, statuses), fields(count = statuses.len()))]
pub async fn seed_statuses(db: &DatabaseConnection, statuses: &[StatusConfig]) -> Result<usize> {
    let mut created = 0;
    for status in statuses {
        let existing = OrderStatus::find()
            .filter(order_status::Column::Nombre.eq(status.name.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        create_status(
            db,
            &status.name,
            status.kind,
            status.description.clone(),
            status.is_terminal(),
        )
        .await?;
        info!("Seeded order status '{}' ({:?})", status.name, status.kind);
        created += 1;
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_initial_status_missing_is_invariant_violation() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_initial_status(&db).await;
        assert!(matches!(
            result,
            Err(Error::InternalInvariantViolation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_statuses_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let statuses = default_status_config();

        let first = seed_statuses(&db, &statuses).await?;
        let second = seed_statuses(&db, &statuses).await?;

        assert_eq!(first, statuses.len());
        assert_eq!(second, 0);
        assert_eq!(get_all_statuses(&db).await?.len(), statuses.len());
        Ok(())
    }

    #[tokio::test]
    async fn test_seeded_flags_follow_kind() -> Result<()> {
        let db = setup_seeded_db().await?;
        let initial = get_initial_status(&db).await?;
        assert_eq!(initial.nombre, "Recibido");
        assert!(!initial.es_final);

        let completed = status_by_kind(&db, StatusKind::Completed).await?;
        assert!(completed.es_final);
        let delivered = status_by_kind(&db, StatusKind::Delivered).await?;
        assert!(!delivered.es_final);
        Ok(())
    }
}
