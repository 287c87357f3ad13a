//! `/reportes` routes; each returns a rendered document as an attachment.

use super::{
    AppState, document_response,
    auth::{ADMIN, ADMIN_KITCHEN, ADMIN_SELLER, AuthUser},
    error::ApiQuery,
    orders::OrderQuery,
};
use crate::{core::report, errors::Result};
use axum::{Router, extract::State, response::Response, routing::get};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/reportes/clientes-pdf", get(clients))
        .route("/reportes/pedidos-pdf", get(orders))
        .route("/reportes/inventario-pdf", get(inventory))
        .route("/reportes/productos-vendidos-pdf", get(products_sold))
}

async fn clients(State(state): State<AppState>, auth: AuthUser) -> Result<Response> {
    auth.require(ADMIN_SELLER)?;
    let doc = report::clients_report(state.db.as_ref(), &state.config.business).await?;
    document_response(state.renderer.as_ref(), &doc)
}

async fn orders(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Response> {
    auth.require(ADMIN)?;
    let doc = report::orders_report(state.db.as_ref(), &state.config.business, query.filter()?).await?;
    document_response(state.renderer.as_ref(), &doc)
}

async fn inventory(State(state): State<AppState>, auth: AuthUser) -> Result<Response> {
    auth.require(ADMIN_KITCHEN)?;
    let doc = report::inventory_report(state.db.as_ref(), &state.config.business).await?;
    document_response(state.renderer.as_ref(), &doc)
}

async fn products_sold(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Response> {
    auth.require(ADMIN)?;
    let doc =
        report::products_sold_report(state.db.as_ref(), &state.config.business, query.filter()?).await?;
    document_response(state.renderer.as_ref(), &doc)
}
