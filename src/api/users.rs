//! `/usuarios` and `/verifyToken` routes.

use super::{
    AppState, ListQuery,
    auth::{ADMIN, ADMIN_SELLER, ANY_ROLE, AuthUser},
    error::{ApiJson, ApiPath, ApiQuery},
};
use crate::{
    core::user::{self, NewUser, UserChanges, UserPage, UserSummary},
    entities::user as user_entity,
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Serialize;

/// Full record for admins, basic fields for everyone else
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum UserView {
    Full(user_entity::Model),
    Basic(UserSummary),
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/usuarios", get(list).post(create))
        .route("/usuarios/{id}", get(show).put(update).delete(remove))
        .route("/verifyToken", get(verify_token))
}

async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<UserPage>> {
    auth.require(ADMIN)?;
    let page = user::list_users(
        state.db.as_ref(),
        query.page_request(),
        query.search.as_deref(),
    )
    .await?;
    Ok(Json(page))
}

async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserView>> {
    auth.require(ADMIN_SELLER)?;
    let found = user::get_user_by_id(state.db.as_ref(), id)
        .await?
        .ok_or_else(|| Error::not_found("User", id))?;
    if auth.is_admin() {
        Ok(Json(UserView::Full(found)))
    } else {
        Ok(Json(UserView::Basic(found.into())))
    }
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<user_entity::Model>)> {
    auth.require(ADMIN)?;
    if input.contrasena.is_none() {
        return Err(Error::invalid_input("Field 'contrasena' is required"));
    }
    let created = user::create_user(state.db.as_ref(), state.hasher.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UserChanges>,
) -> Result<Json<user_entity::Model>> {
    auth.require(ADMIN)?;
    let updated = user::update_user(state.db.as_ref(), state.hasher.as_ref(), id, changes).await?;
    Ok(Json(updated))
}

async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    auth.require(ADMIN)?;
    user::delete_user(state.db.as_ref(), auth.0.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_token(auth: AuthUser) -> Result<Json<UserSummary>> {
    auth.require(ANY_ROLE)?;
    Ok(Json(auth.0.into()))
}
