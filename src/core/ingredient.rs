//! Ingredient business logic - inventory items and the recipes that consume them.
//!
//! Stock levels are only lowered through [`crate::core::stock`]; the CRUD here
//! sets them directly (restocking, corrections).

use crate::{
    core::clean_optional,
    entities::{Ingredient, Product, Recipe, ingredient, recipe},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Fields required to create an ingredient
#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub stock: Decimal,
    pub unidad_medida: String,
    pub costo_por_unidad: Decimal,
}

/// Partial update of an ingredient
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientChanges {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub stock: Option<Decimal>,
    pub unidad_medida: Option<String>,
    pub costo_por_unidad: Option<Decimal>,
}

/// Fields required to attach an ingredient to a product
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInput {
    pub ingrediente_id: i64,
    pub cantidad: Decimal,
    pub instrucciones: Option<String>,
}

/// A recipe entry together with its ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub receta: recipe::Model,
    pub ingrediente: Option<ingredient::Model>,
}

fn non_negative(value: Decimal, field: &str) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(Error::invalid_input(format!(
            "Field '{field}' cannot be negative"
        )));
    }
    Ok(())
}

async fn ensure_unique_name(
    db: &DatabaseConnection,
    nombre: &str,
    exclude_id: Option<i64>,
) -> Result<()> {
    let mut query = Ingredient::find().filter(ingredient::Column::Nombre.eq(nombre));
    if let Some(id) = exclude_id {
        query = query.filter(ingredient::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(Error::invalid_input(format!(
            "An ingredient named '{nombre}' already exists"
        )));
    }
    Ok(())
}

/// Retrieves every ingredient ordered by name.
pub async fn list_ingredients(db: &DatabaseConnection) -> Result<Vec<ingredient::Model>> {
    Ingredient::find()
        .order_by_asc(ingredient::Column::Nombre)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an ingredient by ID.
pub async fn get_ingredient_by_id<C>(db: &C, ingredient_id: i64) -> Result<Option<ingredient::Model>>
where
    C: ConnectionTrait,
{
    Ingredient::find_by_id(ingredient_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates an ingredient with a unique name and non-negative stock and cost.
pub async fn create_ingredient(
    db: &DatabaseConnection,
    input: NewIngredient,
) -> Result<ingredient::Model> {
    let nombre = input.nombre.trim().to_string();
    let unidad = input.unidad_medida.trim().to_string();
    if nombre.is_empty() || unidad.is_empty() {
        return Err(Error::invalid_input(
            "Fields 'nombre' and 'unidad_medida' are required",
        ));
    }
    non_negative(input.stock, "stock")?;
    non_negative(input.costo_por_unidad, "costo_por_unidad")?;
    ensure_unique_name(db, &nombre, None).await?;

    let now = chrono::Utc::now();
    ingredient::ActiveModel {
        nombre: Set(nombre),
        descripcion: Set(clean_optional(input.descripcion)),
        stock: Set(input.stock),
        unidad_medida: Set(unidad),
        costo_por_unidad: Set(input.costo_por_unidad),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Applies a partial update to an ingredient.
pub async fn update_ingredient(
    db: &DatabaseConnection,
    ingredient_id: i64,
    changes: IngredientChanges,
) -> Result<ingredient::Model> {
    let existing = get_ingredient_by_id(db, ingredient_id)
        .await?
        .ok_or_else(|| Error::not_found("Ingredient", ingredient_id))?;

    let nombre = clean_optional(changes.nombre);
    if let Some(nombre) = &nombre {
        if *nombre != existing.nombre {
            ensure_unique_name(db, nombre, Some(ingredient_id)).await?;
        }
    }
    if let Some(stock) = changes.stock {
        non_negative(stock, "stock")?;
    }
    if let Some(costo) = changes.costo_por_unidad {
        non_negative(costo, "costo_por_unidad")?;
    }

    let mut active: ingredient::ActiveModel = existing.into();
    if let Some(nombre) = nombre {
        active.nombre = Set(nombre);
    }
    if let Some(descripcion) = clean_optional(changes.descripcion) {
        active.descripcion = Set(Some(descripcion));
    }
    if let Some(stock) = changes.stock {
        active.stock = Set(stock);
    }
    if let Some(unidad) = clean_optional(changes.unidad_medida) {
        active.unidad_medida = Set(unidad);
    }
    if let Some(costo) = changes.costo_por_unidad {
        active.costo_por_unidad = Set(costo);
    }
    active.updated_at = Set(chrono::Utc::now());

    active.update(db).await.map_err(Into::into)
}

/// Deletes an ingredient that no recipe uses.
pub async fn delete_ingredient(db: &DatabaseConnection, ingredient_id: i64) -> Result<()> {
    let existing = get_ingredient_by_id(db, ingredient_id)
        .await?
        .ok_or_else(|| Error::not_found("Ingredient", ingredient_id))?;

    let recipes = Recipe::find()
        .filter(recipe::Column::IngredienteId.eq(ingredient_id))
        .count(db)
        .await?;
    if recipes > 0 {
        return Err(Error::invalid_input(format!(
            "Ingredient '{}' cannot be deleted because it is used by {recipes} recipe(s)",
            existing.nombre
        )));
    }

    existing.delete(db).await?;
    Ok(())
}

/// Lists the recipe of a product with each ingredient expanded.
pub async fn list_recipes_for_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<RecipeDetail>> {
    if Product::find_by_id(product_id).one(db).await?.is_none() {
        return Err(Error::not_found("Product", product_id));
    }

    let rows = Recipe::find()
        .filter(recipe::Column::ProductoId.eq(product_id))
        .order_by_asc(recipe::Column::Id)
        .find_also_related(Ingredient)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(receta, ingrediente)| RecipeDetail {
            receta,
            ingrediente,
        })
        .collect())
}

/// Adds an ingredient to a product's recipe.
///
/// Each ingredient appears at most once per product and must be required in a
/// positive quantity.
pub async fn add_recipe(
    db: &DatabaseConnection,
    product_id: i64,
    input: RecipeInput,
) -> Result<recipe::Model> {
    if input.cantidad <= Decimal::ZERO {
        return Err(Error::invalid_input("Recipe quantity must be positive"));
    }
    if Product::find_by_id(product_id).one(db).await?.is_none() {
        return Err(Error::not_found("Product", product_id));
    }
    if get_ingredient_by_id(db, input.ingrediente_id)
        .await?
        .is_none()
    {
        return Err(Error::invalid_input(format!(
            "Ingredient {} not found",
            input.ingrediente_id
        )));
    }

    let duplicate = Recipe::find()
        .filter(recipe::Column::ProductoId.eq(product_id))
        .filter(recipe::Column::IngredienteId.eq(input.ingrediente_id))
        .one(db)
        .await?;
    if duplicate.is_some() {
        return Err(Error::invalid_input(
            "This ingredient is already part of the product's recipe",
        ));
    }

    recipe::ActiveModel {
        producto_id: Set(product_id),
        ingrediente_id: Set(input.ingrediente_id),
        cantidad: Set(input.cantidad),
        instrucciones: Set(clean_optional(input.instrucciones)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Removes a recipe entry.
pub async fn delete_recipe(db: &DatabaseConnection, recipe_id: i64) -> Result<()> {
    let result = Recipe::delete_by_id(recipe_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Recipe", recipe_id));
    }
    Ok(())
}
