//! `/categorias` and `/productos` routes, including product recipes.

use super::{
    AppState,
    auth::{ADMIN, ADMIN_KITCHEN, ANY_ROLE, AuthUser},
    error::{ApiJson, ApiPath, ApiQuery},
};
use crate::{
    core::{
        catalog::{self, NewProduct, ProductChanges, ProductDetail, ProductFilter},
        ingredient::{self, RecipeDetail, RecipeInput},
    },
    entities::{category, product, recipe},
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct NewCategory {
    nombre: String,
    descripcion: Option<String>,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/categorias", get(list_categories).post(create_category))
        .route("/productos", get(list_products).post(create_product))
        .route(
            "/productos/{id}",
            get(show_product).put(update_product).delete(delete_product),
        )
        .route(
            "/productos/{id}/recetas",
            get(list_recipes).post(add_recipe),
        )
        .route("/recetas/{id}", delete(delete_recipe))
}

async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<category::Model>>> {
    auth.require(ANY_ROLE)?;
    Ok(Json(catalog::list_categories(state.db.as_ref()).await?))
}

async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewCategory>,
) -> Result<(StatusCode, Json<category::Model>)> {
    auth.require(ADMIN)?;
    let created = catalog::create_category(state.db.as_ref(), &input.nombre, input.descripcion).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_products(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<Json<Vec<ProductDetail>>> {
    auth.require(ANY_ROLE)?;
    Ok(Json(catalog::list_products(state.db.as_ref(), filter).await?))
}

async fn show_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ProductDetail>> {
    auth.require(ANY_ROLE)?;
    catalog::get_product_detail(state.db.as_ref(), id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Product", id))
}

async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<product::Model>)> {
    auth.require(ADMIN)?;
    let created = catalog::create_product(state.db.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<ProductChanges>,
) -> Result<Json<product::Model>> {
    auth.require(ADMIN)?;
    Ok(Json(catalog::update_product(state.db.as_ref(), id, changes).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    auth.require(ADMIN)?;
    catalog::delete_product(state.db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_recipes(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<RecipeDetail>>> {
    auth.require(ADMIN_KITCHEN)?;
    Ok(Json(ingredient::list_recipes_for_product(state.db.as_ref(), id).await?))
}

async fn add_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<RecipeInput>,
) -> Result<(StatusCode, Json<recipe::Model>)> {
    auth.require(ADMIN)?;
    let created = ingredient::add_recipe(state.db.as_ref(), id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_recipe(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    auth.require(ADMIN)?;
    ingredient::delete_recipe(state.db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
