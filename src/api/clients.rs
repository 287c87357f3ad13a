//! `/clientes` routes.

use super::{
    AppState, ListQuery,
    auth::{ADMIN, ADMIN_SELLER, AuthUser},
    error::{ApiJson, ApiPath, ApiQuery},
};
use crate::{
    core::client::{self, ClientInput, ClientPage},
    entities::client as client_entity,
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
        .route("/clientes", get(list).post(create))
        .route("/clientes/{id}", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ClientPage>> {
    auth.require(ADMIN_SELLER)?;
    let page =
        client::list_clients(state.db.as_ref(), query.page_request(), query.search.as_deref()).await?;
    Ok(Json(page))
}

async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<client_entity::Model>> {
    auth.require(ADMIN_SELLER)?;
    client::get_client_by_id(state.db.as_ref(), id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Client", id))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<(StatusCode, Json<client_entity::Model>)> {
    auth.require(ADMIN)?;
    let created = client::create_client(state.db.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<Json<client_entity::Model>> {
    auth.require(ADMIN)?;
    Ok(Json(client::update_client(state.db.as_ref(), id, input).await?))
}

async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    auth.require(ADMIN)?;
    client::delete_client(state.db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
