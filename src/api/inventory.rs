//! `/ingredientes` routes.

use super::{
    AppState,
    auth::{ADMIN, ADMIN_KITCHEN, AuthUser},
    error::{ApiJson, ApiPath},
};
use crate::{
    core::ingredient::{self, IngredientChanges, NewIngredient},
    entities::ingredient as ingredient_entity,
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/ingredientes", get(list).post(create))
        .route("/ingredientes/{id}", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ingredient_entity::Model>>> {
    auth.require(ADMIN_KITCHEN)?;
    Ok(Json(ingredient::list_ingredients(state.db.as_ref()).await?))
}

async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ingredient_entity::Model>> {
    auth.require(ADMIN_KITCHEN)?;
    ingredient::get_ingredient_by_id(state.db.as_ref(), id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Ingredient", id))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewIngredient>,
) -> Result<(StatusCode, Json<ingredient_entity::Model>)> {
    auth.require(ADMIN)?;
    let created = ingredient::create_ingredient(state.db.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<IngredientChanges>,
) -> Result<Json<ingredient_entity::Model>> {
    auth.require(ADMIN)?;
    Ok(Json(ingredient::update_ingredient(state.db.as_ref(), id, changes).await?))
}

async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    auth.require(ADMIN)?;
    ingredient::delete_ingredient(state.db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
