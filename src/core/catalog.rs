//! Catalog business logic - product categories and products.
//!
//! Products carry the price that orders snapshot into their lines. A product
//! referenced by any order line can no longer be deleted; deactivate it
//! instead so it stops being orderable.

use crate::{
    config::settings::CategoryConfig,
    core::clean_optional,
    entities::{Category, OrderLine, Product, Recipe, category, order_line, product, recipe},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Fields required to create a product
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    pub costo_estimado: Option<Decimal>,
    pub categoria_id: i64,
    pub imagen_url: Option<String>,
    #[serde(default)]
    pub es_personalizable: bool,
}

/// Partial update of a product; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductChanges {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<Decimal>,
    pub costo_estimado: Option<Decimal>,
    pub categoria_id: Option<i64>,
    pub imagen_url: Option<String>,
    pub activo: Option<bool>,
    pub es_personalizable: Option<bool>,
}

/// Optional filters for product listings
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProductFilter {
    pub categoria: Option<i64>,
    pub activo: Option<bool>,
}

/// A product together with its category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub producto: product::Model,
    pub categoria: Option<category::Model>,
}

/// Retrieves every category ordered by name.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Nombre)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a category with a unique name.
pub async fn create_category(
    db: &DatabaseConnection,
    nombre: &str,
    descripcion: Option<String>,
) -> Result<category::Model> {
    let nombre = nombre.trim();
    if nombre.is_empty() {
        return Err(Error::invalid_input("Category name cannot be empty"));
    }

    let existing = Category::find()
        .filter(category::Column::Nombre.eq(nombre))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::invalid_input(format!(
            "Category '{nombre}' already exists"
        )));
    }

    category::ActiveModel {
        nombre: Set(nombre.to_string()),
        descripcion: Set(clean_optional(descripcion)),
        activa: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates the configured categories that do not exist yet.
#[instrument(skip(db, categories), fields(count = categories.len()))]
pub async fn seed_categories(
    db: &DatabaseConnection,
    categories: &[CategoryConfig],
) -> Result<usize> {
    let mut created = 0;
    for entry in categories {
        let existing = Category::find()
            .filter(category::Column::Nombre.eq(entry.name.trim()))
            .one(db)
            .await?;
        if existing.is_none() {
            create_category(db, &entry.name, entry.description.clone()).await?;
            info!("Seeded category '{}'", entry.name);
            created += 1;
        }
    }
    Ok(created)
}

/// Lists products with their category, ordered by name.
pub async fn list_products(
    db: &DatabaseConnection,
    filter: ProductFilter,
) -> Result<Vec<ProductDetail>> {
    let mut query = Product::find().order_by_asc(product::Column::Nombre);
    if let Some(categoria) = filter.categoria {
        query = query.filter(product::Column::CategoriaId.eq(categoria));
    }
    if let Some(activo) = filter.activo {
        query = query.filter(product::Column::Activo.eq(activo));
    }

    let rows = query.find_also_related(Category).all(db).await?;
    Ok(rows
        .into_iter()
        .map(|(producto, categoria)| ProductDetail {
            producto,
            categoria,
        })
        .collect())
}

/// Finds a product by ID.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a product by ID together with its category.
pub async fn get_product_detail(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<ProductDetail>> {
    let row = Product::find_by_id(product_id)
        .find_also_related(Category)
        .one(db)
        .await?;
    Ok(row.map(|(producto, categoria)| ProductDetail {
        producto,
        categoria,
    }))
}

fn validate_price(precio: Decimal) -> Result<()> {
    if precio <= Decimal::ZERO {
        return Err(Error::invalid_input(format!(
            "Product price must be positive, got {precio}"
        )));
    }
    Ok(())
}

async fn ensure_category_exists(db: &DatabaseConnection, categoria_id: i64) -> Result<()> {
    if Category::find_by_id(categoria_id).one(db).await?.is_none() {
        return Err(Error::invalid_input(format!(
            "Category {categoria_id} not found"
        )));
    }
    Ok(())
}

/// Creates an active product after validating name, price and category.
pub async fn create_product(
    db: &DatabaseConnection,
    new_product: NewProduct,
) -> Result<product::Model> {
    let nombre = new_product.nombre.trim().to_string();
    if nombre.is_empty() {
        return Err(Error::invalid_input("Product name cannot be empty"));
    }
    validate_price(new_product.precio)?;
    ensure_category_exists(db, new_product.categoria_id).await?;

    let now = chrono::Utc::now();
    product::ActiveModel {
        nombre: Set(nombre),
        descripcion: Set(clean_optional(new_product.descripcion)),
        precio: Set(new_product.precio),
        costo_estimado: Set(new_product.costo_estimado),
        categoria_id: Set(new_product.categoria_id),
        imagen_url: Set(clean_optional(new_product.imagen_url)),
        activo: Set(true),
        es_personalizable: Set(new_product.es_personalizable),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Applies a partial update to a product and refreshes its timestamp.
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    changes: ProductChanges,
) -> Result<product::Model> {
    let existing = get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;

    if let Some(categoria_id) = changes.categoria_id {
        ensure_category_exists(db, categoria_id).await?;
    }
    if let Some(precio) = changes.precio {
        validate_price(precio)?;
    }

    let mut active: product::ActiveModel = existing.into();
    if let Some(nombre) = clean_optional(changes.nombre) {
        active.nombre = Set(nombre);
    }
    if let Some(descripcion) = clean_optional(changes.descripcion) {
        active.descripcion = Set(Some(descripcion));
    }
    if let Some(precio) = changes.precio {
        active.precio = Set(precio);
    }
    if let Some(costo) = changes.costo_estimado {
        active.costo_estimado = Set(Some(costo));
    }
    if let Some(categoria_id) = changes.categoria_id {
        active.categoria_id = Set(categoria_id);
    }
    if let Some(imagen_url) = clean_optional(changes.imagen_url) {
        active.imagen_url = Set(Some(imagen_url));
    }
    if let Some(activo) = changes.activo {
        active.activo = Set(activo);
    }
    if let Some(personalizable) = changes.es_personalizable {
        active.es_personalizable = Set(personalizable);
    }
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Deletes a product that no order line references, together with its recipe.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let existing = get_product_by_id(db, product_id)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))?;

    let references = OrderLine::find()
        .filter(order_line::Column::ProductoId.eq(product_id))
        .count(db)
        .await?;
    if references > 0 {
        return Err(Error::invalid_input(format!(
            "Product '{}' cannot be deleted because it is referenced by {references} order line(s)",
            existing.nombre
        )));
    }

    let txn = db.begin().await?;
    Recipe::delete_many()
        .filter(recipe::Column::ProductoId.eq(product_id))
        .exec(&txn)
        .await?;
    existing.delete(&txn).await?;
    txn.commit().await?;
    Ok(())
}
