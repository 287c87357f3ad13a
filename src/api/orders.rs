//! `/pedidos` and `/estados` routes.

use super::{
    AppState, date_bounds,
    auth::{ADMIN, ADMIN_KITCHEN, ADMIN_SELLER, ANY_ROLE, AuthUser},
    error::{ApiJson, ApiPath, ApiQuery},
};
use crate::{
    core::{
        order::{self, NewOrder, OrderDetail, OrderFilter},
        status,
        transition::{self, TransitionOutcome},
    },
    entities::order_status,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct OrderQuery {
    estado: Option<i64>,
    fecha_inicio: Option<String>,
    fecha_fin: Option<String>,
}

impl OrderQuery {
    pub(super) fn filter(&self) -> Result<OrderFilter> {
        let (desde, hasta) = date_bounds(self.fecha_inicio.as_deref(), self.fecha_fin.as_deref())?;
        Ok(OrderFilter {
            estado_id: self.estado,
            desde,
            hasta,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    estado_id: i64,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/pedidos", get(list).post(create))
        .route("/pedidos/{id}", get(show).delete(remove))
        .route("/pedidos/{id}/estado", put(change_status))
        .route("/estados", get(list_statuses))
}

async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<Vec<OrderDetail>>> {
    auth.require(ANY_ROLE)?;
    Ok(Json(order::list_orders(state.db.as_ref(), query.filter()?).await?))
}

async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<OrderDetail>> {
    auth.require(ANY_ROLE)?;
    Ok(Json(order::get_order_detail(state.db.as_ref(), id).await?))
}

async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewOrder>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    auth.require(ADMIN_SELLER)?;
    let created = order::create_order(state.db.as_ref(), auth.0.id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn change_status(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<Json<TransitionOutcome>> {
    auth.require(ADMIN_KITCHEN)?;
    Ok(Json(
        transition::transition_order(state.db.as_ref(), id, change.estado_id).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode> {
    auth.require(ADMIN)?;
    order::delete_order(state.db.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_statuses(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<order_status::Model>>> {
    auth.require(ANY_ROLE)?;
    Ok(Json(status::get_all_statuses(state.db.as_ref()).await?))
}
