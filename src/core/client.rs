//! Client business logic - customer records attached to orders.
//!
//! National IDs are normalized before every write: all non-digits are stripped
//! and the nine remaining digits are stored as `########-#`. Phone numbers
//! have their whitespace removed.

use crate::{
    core::{PageRequest, Pagination, clean_optional, like_pattern},
    entities::{Client, Order, client, order},
    errors::{Error, Result},
};
use sea_orm::{Condition, PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Fields accepted when creating or updating a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInput {
    pub nombre: Option<String>,
    pub dui: Option<String>,
    pub direccion: Option<String>,
    pub telefono: Option<String>,
}

/// A page of clients
#[derive(Debug, Clone, Serialize)]
pub struct ClientPage {
    pub clientes: Vec<client::Model>,
    pub pagination: Pagination,
}

/// Normalizes a national ID to `########-#`.
///
/// # Errors
/// Returns [`Error::InvalidInput`] unless exactly nine digits remain after
/// stripping every other character.
pub fn normalize_dui(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 9 {
        return Err(Error::invalid_input(format!(
            "Invalid DUI '{raw}': expected format 12345678-9"
        )));
    }
    Ok(format!("{}-{}", &digits[..8], &digits[8..]))
}

/// Removes whitespace from a phone number and checks its characters.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let phone: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let valid = !phone.is_empty()
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-'));
    if !valid {
        return Err(Error::invalid_input(format!("Invalid phone number '{raw}'")));
    }
    Ok(phone)
}

fn normalize_optional(
    value: Option<String>,
    normalize: fn(&str) -> Result<String>,
) -> Result<Option<String>> {
    clean_optional(value).as_deref().map(normalize).transpose()
}

async fn ensure_unique_dui(
    db: &DatabaseConnection,
    dui: &str,
    exclude_id: Option<i64>,
) -> Result<()> {
    let mut query = Client::find().filter(client::Column::Dui.eq(dui));
    if let Some(id) = exclude_id {
        query = query.filter(client::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(Error::invalid_input(format!(
            "A client with DUI {dui} already exists"
        )));
    }
    Ok(())
}

/// Lists clients, newest first, optionally searching name, DUI and phone.
pub async fn list_clients(
    db: &DatabaseConnection,
    request: PageRequest,
    search: Option<&str>,
) -> Result<ClientPage> {
    let mut query = Client::find()
        .order_by_desc(client::Column::CreatedAt)
        .order_by_desc(client::Column::Id);
    if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(term);
        query = query.filter(
            Condition::any()
                .add(client::Column::Nombre.like(pattern.as_str()))
                .add(client::Column::Dui.like(pattern.as_str()))
                .add(client::Column::Telefono.like(pattern.as_str())),
        );
    }

    let paginator = query.paginate(db, request.limit());
    let total = paginator.num_items().await?;
    let clientes = paginator.fetch_page(request.page() - 1).await?;

    Ok(ClientPage {
        clientes,
        pagination: Pagination::new(total, request),
    })
}

/// Retrieves every client ordered by id, newest first.
pub async fn get_all_clients(db: &DatabaseConnection) -> Result<Vec<client::Model>> {
    Client::find()
        .order_by_desc(client::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a client by ID.
pub async fn get_client_by_id<C>(db: &C, client_id: i64) -> Result<Option<client::Model>>
where
    C: ConnectionTrait,
{
    Client::find_by_id(client_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a client. The name is required; DUI must be unique once normalized.
pub async fn create_client(db: &DatabaseConnection, input: ClientInput) -> Result<client::Model> {
    let nombre = clean_optional(input.nombre)
        .ok_or_else(|| Error::invalid_input("Client name is required"))?;
    let dui = normalize_optional(input.dui, normalize_dui)?;
    let telefono = normalize_optional(input.telefono, normalize_phone)?;

    if let Some(dui) = &dui {
        ensure_unique_dui(db, dui, None).await?;
    }

    let now = chrono::Utc::now();
    client::ActiveModel {
        nombre: Set(nombre),
        dui: Set(dui),
        direccion: Set(clean_optional(input.direccion)),
        telefono: Set(telefono),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Updates a client; fields left empty keep their current value.
pub async fn update_client(
    db: &DatabaseConnection,
    client_id: i64,
    input: ClientInput,
) -> Result<client::Model> {
    let existing = get_client_by_id(db, client_id)
        .await?
        .ok_or_else(|| Error::not_found("Client", client_id))?;

    let dui = normalize_optional(input.dui, normalize_dui)?;
    if let Some(dui) = &dui {
        if existing.dui.as_deref() != Some(dui.as_str()) {
            ensure_unique_dui(db, dui, Some(client_id)).await?;
        }
    }
    let telefono = normalize_optional(input.telefono, normalize_phone)?;

    let mut active: client::ActiveModel = existing.into();
    if let Some(nombre) = clean_optional(input.nombre) {
        active.nombre = Set(nombre);
    }
    if let Some(dui) = dui {
        active.dui = Set(Some(dui));
    }
    if let Some(direccion) = clean_optional(input.direccion) {
        active.direccion = Set(Some(direccion));
    }
    if let Some(telefono) = telefono {
        active.telefono = Set(Some(telefono));
    }
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Deletes a client that has no orders.
pub async fn delete_client(db: &DatabaseConnection, client_id: i64) -> Result<()> {
    let existing = get_client_by_id(db, client_id)
        .await?
        .ok_or_else(|| Error::not_found("Client", client_id))?;

    let orders = Order::find()
        .filter(order::Column::ClienteId.eq(client_id))
        .count(db)
        .await?;
    if orders > 0 {
        return Err(Error::invalid_input(
            "Cannot delete a client that has orders",
        ));
    }

    existing.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_normalize_dui() {
        assert_eq!(normalize_dui("123456789").unwrap(), "12345678-9");
        assert_eq!(normalize_dui("12345678-9").unwrap(), "12345678-9");
        assert_eq!(normalize_dui(" 1234 5678 9 ").unwrap(), "12345678-9");
        assert!(normalize_dui("1234").is_err());
        assert!(normalize_dui("1234567890").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+503 7777 8888").unwrap(), "+50377778888");
        assert_eq!(normalize_phone("(503) 2222-3333").unwrap(), "(503)2222-3333");
        assert!(normalize_phone("call me").is_err());
    }

    #[tokio::test]
    async fn test_create_client_normalizes_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_client(
            &db,
            ClientInput {
                nombre: Some("  María López ".to_string()),
                dui: Some("123456789".to_string()),
                direccion: None,
                telefono: Some("7777 8888".to_string()),
            },
        )
        .await?;

        assert_eq!(client.nombre, "María López");
        assert_eq!(client.dui.as_deref(), Some("12345678-9"));
        assert_eq!(client.telefono.as_deref(), Some("77778888"));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_dui_rejected_after_normalization() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_client(&db, "María", Some("12345678-9")).await?;

        let result = create_client(
            &db,
            ClientInput {
                nombre: Some("Otra".to_string()),
                dui: Some("123456789".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_client_keeps_missing_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "María", Some("12345678-9")).await?;

        let updated = update_client(
            &db,
            client.id,
            ClientInput {
                direccion: Some("Colonia Escalón".to_string()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.nombre, "María");
        assert_eq!(updated.dui.as_deref(), Some("12345678-9"));
        assert_eq!(updated.direccion.as_deref(), Some("Colonia Escalón"));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_clients_search() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_client(&db, "María", Some("12345678-9")).await?;
        create_test_client(&db, "José", None).await?;

        let page = list_clients(&db, PageRequest::default(), Some("Jos")).await?;
        assert_eq!(page.clientes.len(), 1);
        assert_eq!(page.pagination.total, 1);

        let page = list_clients(&db, PageRequest::default(), None).await?;
        assert_eq!(page.clientes.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_clients_past_last_page() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_client(&db, "María", None).await?;

        let request = PageRequest {
            page: u64::MAX,
            limit: 10,
        };
        let page = list_clients(&db, request, None).await?;
        assert!(page.clientes.is_empty());
        assert_eq!(page.pagination.total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_client() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "María", None).await?;
        delete_client(&db, client.id).await?;
        assert!(get_client_by_id(&db, client.id).await?.is_none());

        let result = delete_client(&db, client.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
