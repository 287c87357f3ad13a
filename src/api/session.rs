//! `/login` and `/logout` routes.

use super::{
    AppState,
    auth::{AuthUser, bearer_token},
    error::ApiJson,
};
use crate::{
    core::session::{self, LoginOutcome},
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Credentials {
    correo: String,
    contrasena: String,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<LoginOutcome>> {
    let outcome = session::login(
        state.db.as_ref(),
        state.hasher.as_ref(),
        state.issuer.as_ref(),
        credentials.correo.trim(),
        &credentials.contrasena,
        state.session_ttl(),
    )
    .await?;
    Ok(Json(outcome))
}

/// Ends the session the request authenticated with. Config tokens have no
/// session and are left untouched.
async fn logout(
    State(state): State<AppState>,
    _auth: AuthUser,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let token = bearer_token(&headers).ok_or_else(|| Error::Unauthorized {
        message: "Access denied, no token provided".to_string(),
    })?;
    session::logout(state.db.as_ref(), token).await?;
    Ok(StatusCode::NO_CONTENT)
}
