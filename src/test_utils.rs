//! Shared test utilities for the order backend.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::settings::StatusConfig,
    core::{
        catalog::{self, NewProduct},
        client::{self, ClientInput},
        credentials::Argon2Hasher,
        ingredient::{self, NewIngredient, RecipeInput},
        order::{self, NewOrder, OrderDetail, OrderLineInput},
        status,
        user::{self, NewUser},
    },
    entities::{self, OrderStatus, Role, StatusKind},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Argon2 hasher with minimal cost so tests hash quickly.
pub fn test_hasher() -> Result<Argon2Hasher> {
    Argon2Hasher::with_params(8, 1, 1)
}

/// The status set shipped in `config.toml`.
pub fn default_status_config() -> Vec<StatusConfig> {
    [
        ("Recibido", StatusKind::Received),
        ("En Preparación", StatusKind::Preparing),
        ("Entregado", StatusKind::Delivered),
        ("Completado", StatusKind::Completed),
        ("Cancelado", StatusKind::Cancelled),
    ]
    .into_iter()
    .map(|(name, kind)| StatusConfig {
        name: name.to_string(),
        kind,
        description: None,
        terminal: None,
    })
    .collect()
}

/// Test database with the default statuses seeded.
pub async fn setup_seeded_db() -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    status::seed_statuses(&db, &default_status_config()).await?;
    Ok(db)
}

/// Looks up the first status of the given kind.
pub async fn status_by_kind(
    db: &DatabaseConnection,
    kind: StatusKind,
) -> Result<entities::order_status::Model> {
    OrderStatus::find()
        .filter(entities::order_status::Column::Kind.eq(kind))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("OrderStatus", format!("{kind:?}")))
}

/// User creation input with sensible defaults.
///
/// # Defaults
/// * nit: derived from the e-mail, so distinct e-mails never collide
/// * telefono: "2222-3333"
pub fn new_user_input(name: &str, email: &str, role: Role) -> NewUser {
    NewUser {
        nombre: name.to_string(),
        nit: format!("NIT-{email}"),
        nrc: None,
        giro: None,
        correo: email.to_string(),
        telefono: "2222-3333".to_string(),
        rol: role,
        contrasena: None,
    }
}

/// Creates a test user named after the local part of `email`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
) -> Result<entities::user::Model> {
    let name = email.split('@').next().unwrap_or(email);
    user::create_user(db, &test_hasher()?, new_user_input(name, email, role)).await
}

/// Creates a seller account that can log in with `password`.
pub async fn create_user_with_password(
    db: &DatabaseConnection,
    hasher: &Argon2Hasher,
    email: &str,
    password: &str,
) -> Result<entities::user::Model> {
    let name = email.split('@').next().unwrap_or(email);
    let mut input = new_user_input(name, email, Role::Seller);
    input.contrasena = Some(password.to_string());
    user::create_user(db, hasher, input).await
}

/// Creates a test client with an optional DUI.
pub async fn create_test_client(
    db: &DatabaseConnection,
    name: &str,
    dui: Option<&str>,
) -> Result<entities::client::Model> {
    client::create_client(
        db,
        ClientInput {
            nombre: Some(name.to_string()),
            dui: dui.map(str::to_string),
            direccion: None,
            telefono: Some("7777 8888".to_string()),
        },
    )
    .await
}

/// Product creation input with no optional fields.
pub fn new_product_input(name: &str, price: Decimal, category_id: i64) -> NewProduct {
    NewProduct {
        nombre: name.to_string(),
        descripcion: None,
        precio: price,
        costo_estimado: None,
        categoria_id: category_id,
        imagen_url: None,
        es_personalizable: false,
    }
}

/// Creates a test product in the given category.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    category_id: i64,
) -> Result<entities::product::Model> {
    catalog::create_product(db, new_product_input(name, price, category_id)).await
}

/// Creates a test ingredient.
///
/// # Defaults
/// * `unidad_medida`: "kg"
/// * `costo_por_unidad`: 1.50
pub async fn create_test_ingredient(
    db: &DatabaseConnection,
    name: &str,
    stock: Decimal,
) -> Result<entities::ingredient::Model> {
    ingredient::create_ingredient(
        db,
        NewIngredient {
            nombre: name.to_string(),
            descripcion: None,
            stock,
            unidad_medida: "kg".to_string(),
            costo_por_unidad: dec!(1.50),
        },
    )
    .await
}

/// Seeded database with one product whose recipe uses one ingredient.
///
/// Returns `(db, product, ingredient)`; the product costs 10.00 and consumes
/// `per_unit` of the ingredient for each unit ordered.
pub async fn setup_with_recipe(
    stock: Decimal,
    per_unit: Decimal,
) -> Result<(
    DatabaseConnection,
    entities::product::Model,
    entities::ingredient::Model,
)> {
    let db = setup_seeded_db().await?;
    let category = catalog::create_category(&db, "Pizzas", None).await?;
    let product = create_test_product(&db, "Margarita", dec!(10.00), category.id).await?;
    let harina = create_test_ingredient(&db, "Harina", stock).await?;
    ingredient::add_recipe(
        &db,
        product.id,
        RecipeInput {
            ingrediente_id: harina.id,
            cantidad: per_unit,
            instrucciones: None,
        },
    )
    .await?;
    Ok((db, product, harina))
}

/// A seeded database with a seller and an orderable product
pub struct OrderContext {
    pub db: DatabaseConnection,
    pub seller: entities::user::Model,
    pub product: entities::product::Model,
}

/// Seeded database with a seller account and a 10.00 product without recipe.
pub async fn setup_order_context() -> Result<OrderContext> {
    let db = setup_seeded_db().await?;
    let seller = create_test_user(&db, "vendedor@example.com", Role::Seller).await?;
    let category = catalog::create_category(&db, "Pizzas", None).await?;
    let product = create_test_product(&db, "Margarita", dec!(10.00), category.id).await?;
    Ok(OrderContext {
        db,
        seller,
        product,
    })
}

/// Creates an order from `(product_id, quantity)` pairs.
pub async fn create_test_order(
    db: &DatabaseConnection,
    user_id: i64,
    client_id: Option<i64>,
    lines: &[(i64, i32)],
) -> Result<OrderDetail> {
    order::create_order(
        db,
        user_id,
        NewOrder {
            cliente_id: client_id,
            detalles: Some(
                lines
                    .iter()
                    .map(|&(producto_id, cantidad)| OrderLineInput {
                        producto_id,
                        cantidad: Some(cantidad),
                        instrucciones_especiales: None,
                    })
                    .collect(),
            ),
            ..Default::default()
        },
    )
    .await
}
