//! Invoice business logic - emission, numbering, annulment and queries.
//!
//! Invoice numbers take the form `FAC-<year>-<NNNN>` and come from a per-year
//! counter row in `secuencias_factura`, advanced with an atomic UPDATE inside
//! the caller's transaction. A year with no counter row yet is seeded from the
//! highest number already issued that year, so databases that predate the
//! counter keep a gap-free sequence.

use crate::{
    core::order::{self, OrderDetail},
    entities::{
        Invoice, InvoiceLine, InvoiceSequence, InvoiceState, OrderLine, Product, invoice,
        invoice_line, invoice_sequence, order_line,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, TimeDelta, Utc};
use rust_decimal_macros::dec;
use sea_orm::{
    QueryOrder, QuerySelect, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Days between emission and due date
pub const PAYMENT_TERM_DAYS: i64 = 30;

/// Optional filters for invoice listings
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceFilter {
    pub estado: Option<InvoiceState>,
    pub desde: Option<DateTime<Utc>>,
    pub hasta: Option<DateTime<Utc>>,
}

/// An invoice with its order header and frozen lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub factura: invoice::Model,
    pub pedido: Option<OrderDetail>,
    pub detalles: Vec<invoice_line::Model>,
}

/// Formats an invoice number from its year and sequence.
#[must_use]
pub fn format_invoice_number(year: i32, sequence: i32) -> String {
    format!("FAC-{year}-{sequence:04}")
}

/// Extracts the sequence from an invoice number (its trailing segment).
#[must_use]
pub fn parse_sequence(number: &str) -> Option<i32> {
    number.rsplit('-').next()?.parse().ok()
}

async fn highest_issued_sequence<C>(db: &C, year: i32) -> Result<i32>
where
    C: ConnectionTrait,
{
    let numbers: Vec<String> = Invoice::find()
        .select_only()
        .column(invoice::Column::NumeroFactura)
        .filter(invoice::Column::NumeroFactura.starts_with(format!("FAC-{year}-")))
        .into_tuple()
        .all(db)
        .await?;
    Ok(numbers
        .iter()
        .filter_map(|n| parse_sequence(n))
        .max()
        .unwrap_or(0))
}

/// Hands out the next sequence number for `year`.
pub async fn next_sequence<C>(db: &C, year: i32, now: DateTime<Utc>) -> Result<i32>
where
    C: ConnectionTrait,
{
    if InvoiceSequence::find_by_id(year).one(db).await?.is_none() {
        let seed = highest_issued_sequence(db, year).await?;
        debug!("Seeding invoice sequence for {year} at {seed}");
        InvoiceSequence::insert(invoice_sequence::ActiveModel {
            anio: Set(year),
            ultimo_numero: Set(seed),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(invoice_sequence::Column::Anio)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    }

    InvoiceSequence::update_many()
        .col_expr(
            invoice_sequence::Column::UltimoNumero,
            Expr::col(invoice_sequence::Column::UltimoNumero).add(1),
        )
        .col_expr(invoice_sequence::Column::UpdatedAt, Expr::value(now))
        .filter(invoice_sequence::Column::Anio.eq(year))
        .exec(db)
        .await?;

    InvoiceSequence::find_by_id(year)
        .one(db)
        .await?
        .map(|row| row.ultimo_numero)
        .ok_or_else(|| Error::InternalInvariantViolation {
            message: format!("Invoice sequence for {year} disappeared"),
        })
}

/// Reserves the next invoice number for the year of `now`.
pub async fn next_invoice_number<C>(db: &C, now: DateTime<Utc>) -> Result<String>
where
    C: ConnectionTrait,
{
    let year = now.year();
    let sequence = next_sequence(db, year, now).await?;
    Ok(format_invoice_number(year, sequence))
}

/// Emits the invoice for an order at `now`, or returns the existing one.
///
/// Copies the order's totals and freezes each line with the product's current
/// name as description. Runs on the caller's connection or transaction.
#[instrument(skip(db))]
pub async fn emit_invoice_at<C>(db: &C, order_id: i64, now: DateTime<Utc>) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    let pedido = order::get_order_by_id(db, order_id)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;

    if let Some(existing) = Invoice::find()
        .filter(invoice::Column::PedidoId.eq(order_id))
        .one(db)
        .await?
    {
        debug!(
            "Order {order_id} already invoiced as {}",
            existing.numero_factura
        );
        return Ok(existing);
    }

    let lines = OrderLine::find()
        .filter(order_line::Column::PedidoId.eq(order_id))
        .order_by_asc(order_line::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;

    let numero_factura = next_invoice_number(db, now).await?;

    let factura = invoice::ActiveModel {
        pedido_id: Set(pedido.id),
        numero_factura: Set(numero_factura),
        fecha_emision: Set(now),
        fecha_vencimiento: Set(now + TimeDelta::days(PAYMENT_TERM_DAYS)),
        estado: Set(InvoiceState::Paid),
        subtotal: Set(pedido.subtotal),
        impuestos: Set(pedido.impuestos),
        total: Set(pedido.total),
        descuento: Set(dec!(0)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for (line, product) in lines {
        let descripcion = product
            .map_or_else(|| format!("Producto {}", line.producto_id), |p| p.nombre);
        invoice_line::ActiveModel {
            factura_id: Set(factura.id),
            producto_id: Set(Some(line.producto_id)),
            descripcion: Set(descripcion),
            cantidad: Set(line.cantidad),
            precio_unitario: Set(line.precio_unitario),
            subtotal: Set(line.subtotal),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    info!(
        "Emitted invoice {} for order {order_id}",
        factura.numero_factura
    );
    Ok(factura)
}

/// Emits the invoice for an order now, in its own transaction.
pub async fn emit_invoice(db: &DatabaseConnection, order_id: i64) -> Result<invoice::Model> {
    let txn = db.begin().await?;
    let factura = emit_invoice_at(&txn, order_id, Utc::now()).await?;
    txn.commit().await?;
    Ok(factura)
}

/// Marks an invoice as annulled.
///
/// # Errors
/// [`Error::InvalidTransition`] when the invoice is already annulled.
pub async fn annul_invoice(db: &DatabaseConnection, invoice_id: i64) -> Result<invoice::Model> {
    let factura = Invoice::find_by_id(invoice_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;

    if factura.estado == InvoiceState::Annulled {
        return Err(Error::InvalidTransition {
            message: format!("Invoice {} is already annulled", factura.numero_factura),
        });
    }

    let mut active: invoice::ActiveModel = factura.into();
    active.estado = Set(InvoiceState::Annulled);
    let updated = active.update(db).await?;
    info!("Annulled invoice {}", updated.numero_factura);
    Ok(updated)
}

/// Retrieves the frozen lines of an invoice.
pub async fn get_invoice_lines<C>(db: &C, invoice_id: i64) -> Result<Vec<invoice_line::Model>>
where
    C: ConnectionTrait,
{
    InvoiceLine::find()
        .filter(invoice_line::Column::FacturaId.eq(invoice_id))
        .order_by_asc(invoice_line::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn hydrate(
    db: &DatabaseConnection,
    factura: invoice::Model,
    with_lines: bool,
) -> Result<InvoiceDetail> {
    let pedido = match order::get_order_by_id(db, factura.pedido_id).await? {
        Some(pedido) => Some(order::hydrate(db, pedido, false).await?),
        None => None,
    };
    let detalles = if with_lines {
        get_invoice_lines(db, factura.id).await?
    } else {
        Vec::new()
    };
    Ok(InvoiceDetail {
        factura,
        pedido,
        detalles,
    })
}

/// Finds an invoice with its order, client, user and lines.
pub async fn get_invoice_detail(db: &DatabaseConnection, invoice_id: i64) -> Result<InvoiceDetail> {
    let factura = Invoice::find_by_id(invoice_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Invoice", invoice_id))?;
    hydrate(db, factura, true).await
}

/// Finds the invoice emitted for an order, if any.
pub async fn get_invoice_for_order<C>(db: &C, order_id: i64) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::PedidoId.eq(order_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists invoices, newest first.
pub async fn list_invoices(
    db: &DatabaseConnection,
    filter: InvoiceFilter,
) -> Result<Vec<InvoiceDetail>> {
    let mut query = Invoice::find()
        .order_by_desc(invoice::Column::FechaEmision)
        .order_by_desc(invoice::Column::Id);
    if let Some(estado) = filter.estado {
        query = query.filter(invoice::Column::Estado.eq(estado));
    }
    if let Some(desde) = filter.desde {
        query = query.filter(invoice::Column::FechaEmision.gte(desde));
    }
    if let Some(hasta) = filter.hasta {
        query = query.filter(invoice::Column::FechaEmision.lte(hasta));
    }

    let facturas = query.all(db).await?;
    let mut hydrated = Vec::with_capacity(facturas.len());
    for factura in facturas {
        hydrated.push(hydrate(db, factura, false).await?);
    }
    Ok(hydrated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::TimeZone;
    use sea_orm::PaginatorTrait;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_format_and_parse_number() {
        assert_eq!(format_invoice_number(2024, 1), "FAC-2024-0001");
        assert_eq!(format_invoice_number(2024, 12345), "FAC-2024-12345");
        assert_eq!(parse_sequence("FAC-2024-0042"), Some(42));
        assert_eq!(parse_sequence("FAC-2024-"), None);
    }

    #[tokio::test]
    async fn test_sequence_is_per_year_and_increments() -> Result<()> {
        let ctx = setup_order_context().await?;
        let mut numbers = Vec::new();
        for _ in 0..3 {
            let detail =
                create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await?;
            let factura = emit_invoice_at(&ctx.db, detail.pedido.id, at(2024, 6, 1)).await?;
            numbers.push(factura.numero_factura);
        }
        assert_eq!(numbers, ["FAC-2024-0001", "FAC-2024-0002", "FAC-2024-0003"]);

        let detail =
            create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await?;
        let factura = emit_invoice_at(&ctx.db, detail.pedido.id, at(2025, 1, 2)).await?;
        assert_eq!(factura.numero_factura, "FAC-2025-0001");
        Ok(())
    }

    #[tokio::test]
    async fn test_sequence_seeds_from_existing_invoices() -> Result<()> {
        let ctx = setup_order_context().await?;
        let legacy = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await?;
        invoice::ActiveModel {
            pedido_id: Set(legacy.pedido.id),
            numero_factura: Set("FAC-2024-0007".to_string()),
            fecha_emision: Set(at(2024, 3, 1)),
            fecha_vencimiento: Set(at(2024, 3, 31)),
            estado: Set(InvoiceState::Paid),
            subtotal: Set(legacy.pedido.subtotal),
            impuestos: Set(legacy.pedido.impuestos),
            total: Set(legacy.pedido.total),
            descuento: Set(dec!(0)),
            ..Default::default()
        }
        .insert(&ctx.db)
        .await?;

        let next = next_invoice_number(&ctx.db, at(2024, 4, 1)).await?;
        assert_eq!(next, "FAC-2024-0008");
        Ok(())
    }

    #[tokio::test]
    async fn test_emit_invoice_copies_order() -> Result<()> {
        let ctx = setup_order_context().await?;
        let detail = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 2)]).await?;
        let now = at(2024, 5, 10);

        let factura = emit_invoice_at(&ctx.db, detail.pedido.id, now).await?;
        assert_eq!(factura.subtotal, dec!(20.00));
        assert_eq!(factura.impuestos, dec!(2.60));
        assert_eq!(factura.total, dec!(22.60));
        assert_eq!(factura.descuento, dec!(0));
        assert_eq!(factura.estado, InvoiceState::Paid);
        assert_eq!(factura.fecha_vencimiento, at(2024, 6, 9));

        let lines = get_invoice_lines(&ctx.db, factura.id).await?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].descripcion, ctx.product.nombre);
        assert_eq!(lines[0].cantidad, 2);
        assert_eq!(lines[0].subtotal, dec!(20.00));
        Ok(())
    }

    #[tokio::test]
    async fn test_emit_invoice_is_idempotent() -> Result<()> {
        let ctx = setup_order_context().await?;
        let detail = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await?;

        let first = emit_invoice(&ctx.db, detail.pedido.id).await?;
        let second = emit_invoice(&ctx.db, detail.pedido.id).await?;
        assert_eq!(first.id, second.id);
        assert_eq!(Invoice::find().count(&ctx.db).await?, 1);
        assert_eq!(InvoiceLine::find().count(&ctx.db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_emit_invoice_for_missing_order() -> Result<()> {
        let db = setup_test_db().await?;
        let result = emit_invoice(&db, 77).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_annul_invoice() -> Result<()> {
        let ctx = setup_order_context().await?;
        let detail = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await?;
        let factura = emit_invoice(&ctx.db, detail.pedido.id).await?;

        let annulled = annul_invoice(&ctx.db, factura.id).await?;
        assert_eq!(annulled.estado, InvoiceState::Annulled);
        assert_eq!(annulled.total, factura.total);

        let again = annul_invoice(&ctx.db, factura.id).await;
        assert!(matches!(again, Err(Error::InvalidTransition { .. })));

        let missing = annul_invoice(&ctx.db, 999).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_detail() -> Result<()> {
        let ctx = setup_order_context().await?;
        let first = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await?;
        let second =
            create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 2)]).await?;
        let a = emit_invoice_at(&ctx.db, first.pedido.id, at(2024, 1, 5)).await?;
        let b = emit_invoice_at(&ctx.db, second.pedido.id, at(2024, 2, 5)).await?;
        annul_invoice(&ctx.db, a.id).await?;

        let all = list_invoices(&ctx.db, InvoiceFilter::default()).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].factura.id, b.id);

        let annulled = list_invoices(
            &ctx.db,
            InvoiceFilter {
                estado: Some(InvoiceState::Annulled),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(annulled.len(), 1);
        assert_eq!(annulled[0].factura.id, a.id);

        let february = list_invoices(
            &ctx.db,
            InvoiceFilter {
                desde: Some(at(2024, 2, 1)),
                hasta: Some(at(2024, 2, 28)),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(february.len(), 1);

        let detail = get_invoice_detail(&ctx.db, b.id).await?;
        assert_eq!(detail.detalles.len(), 1);
        let pedido = detail.pedido.unwrap();
        assert_eq!(pedido.pedido.id, second.pedido.id);
        assert_eq!(pedido.usuario.unwrap().id, ctx.seller.id);
        Ok(())
    }
}
