//! `/facturas` routes.

use super::{
    AppState, date_bounds, document_response,
    auth::{ADMIN, ADMIN_SELLER, AuthUser},
    error::{ApiPath, ApiQuery},
};
use crate::{
    core::{
        invoice::{self, InvoiceDetail, InvoiceFilter},
        report,
    },
    entities::{InvoiceState, invoice as invoice_entity},
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::State,
    response::Response,
    routing::{get, put},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct InvoiceQuery {
    estado: Option<String>,
    fecha_inicio: Option<String>,
    fecha_fin: Option<String>,
}

impl InvoiceQuery {
    fn filter(&self) -> Result<InvoiceFilter> {
        let estado = self
            .estado
            .as_deref()
            .map(|value| {
                InvoiceState::parse(value)
                    .ok_or_else(|| Error::invalid_input(format!("Unknown invoice state '{value}'")))
            })
            .transpose()?;
        let (desde, hasta) = date_bounds(self.fecha_inicio.as_deref(), self.fecha_fin.as_deref())?;
        Ok(InvoiceFilter {
            estado,
            desde,
            hasta,
        })
    }
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/facturas", get(list))
        .route("/facturas/{id}", get(show))
        .route("/facturas/{id}/pdf", get(document))
        .route("/facturas/{id}/anular", put(annul))
}

async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<InvoiceQuery>,
) -> Result<Json<Vec<InvoiceDetail>>> {
    auth.require(ADMIN_SELLER)?;
    Ok(Json(invoice::list_invoices(state.db.as_ref(), query.filter()?).await?))
}

async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<InvoiceDetail>> {
    auth.require(ADMIN_SELLER)?;
    Ok(Json(invoice::get_invoice_detail(state.db.as_ref(), id).await?))
}

async fn document(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Response> {
    auth.require(ADMIN_SELLER)?;
    let doc = report::invoice_document(state.db.as_ref(), &state.config.business, id).await?;
    document_response(state.renderer.as_ref(), &doc)
}

async fn annul(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<invoice_entity::Model>> {
    auth.require(ADMIN)?;
    Ok(Json(invoice::annul_invoice(state.db.as_ref(), id).await?))
}
