//! Order business logic - building orders and reading them back hydrated.
//!
//! An order and all of its lines are written in one database transaction, so a
//! failure part-way leaves nothing behind. Totals are computed once here with
//! exact decimal arithmetic and never recomputed:
//! `subtotal = Σ price × qty`, `impuestos = subtotal × 0.13`,
//! `total = subtotal + impuestos`.

use crate::{
    core::{catalog, clean_optional, client, status, user, user::UserSummary},
    entities::{
        Client, Invoice, Order, OrderLine, OrderStatus, Product, User, client as client_entity,
        invoice, order, order_line, order_status, product,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Tax rate applied to every order subtotal
pub const TAX_RATE: Decimal = dec!(0.13);

/// Payment method recorded when the request names none
pub const DEFAULT_PAYMENT_METHOD: &str = "Efectivo";

/// One requested line of a new order
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub producto_id: i64,
    /// Units requested; defaults to 1
    pub cantidad: Option<i32>,
    pub instrucciones_especiales: Option<String>,
}

/// A new order request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrder {
    pub cliente_id: Option<i64>,
    pub detalles: Option<Vec<OrderLineInput>>,
    pub direccion_entrega: Option<String>,
    pub telefono_contacto: Option<String>,
    pub notas: Option<String>,
    pub metodo_pago: Option<String>,
    pub fecha_entrega: Option<DateTime<Utc>>,
}

/// Optional filters for order listings
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub estado_id: Option<i64>,
    pub desde: Option<DateTime<Utc>>,
    pub hasta: Option<DateTime<Utc>>,
}

/// Computed financial fields of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub impuestos: Decimal,
    pub total: Decimal,
}

/// An order line with its product
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineDetail {
    #[serde(flatten)]
    pub detalle: order_line::Model,
    pub producto: Option<product::Model>,
}

/// An order with its status, client, user and (optionally) lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub pedido: order::Model,
    pub estado: Option<order_status::Model>,
    pub cliente: Option<client_entity::Model>,
    pub usuario: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalles: Option<Vec<OrderLineDetail>>,
}

/// Subtotal of a single line.
#[must_use]
pub fn line_subtotal(precio_unitario: Decimal, cantidad: i32) -> Decimal {
    precio_unitario * Decimal::from(cantidad)
}

/// Computes order totals from `(unit price, quantity)` pairs.
#[must_use]
pub fn compute_totals<I>(lines: I) -> OrderTotals
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    let subtotal: Decimal = lines
        .into_iter()
        .map(|(precio, cantidad)| line_subtotal(precio, cantidad))
        .sum();
    let impuestos = subtotal * TAX_RATE;
    OrderTotals {
        subtotal,
        impuestos,
        total: subtotal + impuestos,
    }
}

struct PricedLine {
    product: product::Model,
    cantidad: i32,
    instrucciones: Option<String>,
}

/// Validates and persists a new order with its lines, returning it hydrated.
///
/// # Errors
/// - [`Error::InvalidInput`] when the line list is missing or empty, a quantity
///   is not positive, or a product is unknown or inactive
/// - [`Error::NotFound`] when the referenced client or user does not exist
/// - [`Error::InternalInvariantViolation`] when no initial status is seeded
#[instrument(skip(db, new_order), fields(lines = tracing::field::Empty))]
pub async fn create_order(
    db: &DatabaseConnection,
    usuario_id: i64,
    new_order: NewOrder,
) -> Result<OrderDetail> {
    let lines = new_order.detalles.unwrap_or_default();
    if lines.is_empty() {
        return Err(Error::invalid_input(
            "An order must contain at least one product",
        ));
    }
    tracing::Span::current().record("lines", lines.len());

    for line in &lines {
        if line.cantidad.is_some_and(|c| c <= 0) {
            return Err(Error::invalid_input(format!(
                "Quantity for product {} must be positive",
                line.producto_id
            )));
        }
    }

    let txn = db.begin().await?;

    if let Some(cliente_id) = new_order.cliente_id {
        client::get_client_by_id(&txn, cliente_id)
            .await?
            .ok_or_else(|| Error::not_found("Client", cliente_id))?;
    }
    user::get_user_by_id(&txn, usuario_id)
        .await?
        .ok_or_else(|| Error::not_found("User", usuario_id))?;

    let initial_status = status::get_initial_status(&txn).await?;

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let product = catalog::get_product_by_id(&txn, line.producto_id)
            .await?
            .ok_or_else(|| {
                Error::invalid_input(format!("Product {} not found", line.producto_id))
            })?;
        if !product.activo {
            return Err(Error::invalid_input(format!(
                "Product '{}' is not available",
                product.nombre
            )));
        }
        priced.push(PricedLine {
            product,
            cantidad: line.cantidad.unwrap_or(1),
            instrucciones: clean_optional(line.instrucciones_especiales),
        });
    }

    let totals = compute_totals(priced.iter().map(|l| (l.product.precio, l.cantidad)));

    let pedido = order::ActiveModel {
        cliente_id: Set(new_order.cliente_id),
        usuario_id: Set(usuario_id),
        estado_id: Set(initial_status.id),
        fecha_pedido: Set(Utc::now()),
        fecha_entrega: Set(new_order.fecha_entrega),
        direccion_entrega: Set(clean_optional(new_order.direccion_entrega)),
        telefono_contacto: Set(clean_optional(new_order.telefono_contacto)),
        notas: Set(clean_optional(new_order.notas)),
        subtotal: Set(totals.subtotal),
        impuestos: Set(totals.impuestos),
        total: Set(totals.total),
        metodo_pago: Set(clean_optional(new_order.metodo_pago)
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string())),
        stock_aplicado: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for line in &priced {
        order_line::ActiveModel {
            pedido_id: Set(pedido.id),
            producto_id: Set(line.product.id),
            cantidad: Set(line.cantidad),
            precio_unitario: Set(line.product.precio),
            subtotal: Set(line_subtotal(line.product.precio, line.cantidad)),
            instrucciones_especiales: Set(line.instrucciones.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!(
        "Created order {} with {} line(s), total {}",
        pedido.id,
        priced.len(),
        pedido.total
    );

    hydrate(db, pedido, true).await
}

/// Loads the status, client, user and optionally the lines of an order.
pub async fn hydrate<C>(db: &C, pedido: order::Model, with_lines: bool) -> Result<OrderDetail>
where
    C: ConnectionTrait,
{
    let estado = OrderStatus::find_by_id(pedido.estado_id).one(db).await?;
    let cliente = match pedido.cliente_id {
        Some(id) => Client::find_by_id(id).one(db).await?,
        None => None,
    };
    let usuario = User::find_by_id(pedido.usuario_id)
        .one(db)
        .await?
        .map(UserSummary::from);

    let detalles = if with_lines {
        Some(get_order_lines(db, pedido.id).await?)
    } else {
        None
    };

    Ok(OrderDetail {
        pedido,
        estado,
        cliente,
        usuario,
        detalles,
    })
}

/// Retrieves the lines of an order with their products, in insertion order.
pub async fn get_order_lines<C>(db: &C, order_id: i64) -> Result<Vec<OrderLineDetail>>
where
    C: ConnectionTrait,
{
    let rows = OrderLine::find()
        .filter(order_line::Column::PedidoId.eq(order_id))
        .order_by_asc(order_line::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(detalle, producto)| OrderLineDetail { detalle, producto })
        .collect())
}

/// Finds an order by ID without hydration.
pub async fn get_order_by_id<C>(db: &C, order_id: i64) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an order by ID, fully hydrated including lines.
pub async fn get_order_detail(db: &DatabaseConnection, order_id: i64) -> Result<OrderDetail> {
    let pedido = get_order_by_id(db, order_id)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;
    hydrate(db, pedido, true).await
}

/// Lists orders, newest first, with status, client and user.
pub async fn list_orders(db: &DatabaseConnection, filter: OrderFilter) -> Result<Vec<OrderDetail>> {
    let mut query = Order::find()
        .order_by_desc(order::Column::FechaPedido)
        .order_by_desc(order::Column::Id);
    if let Some(estado_id) = filter.estado_id {
        query = query.filter(order::Column::EstadoId.eq(estado_id));
    }
    if let Some(desde) = filter.desde {
        query = query.filter(order::Column::FechaPedido.gte(desde));
    }
    if let Some(hasta) = filter.hasta {
        query = query.filter(order::Column::FechaPedido.lte(hasta));
    }

    let orders = query.all(db).await?;
    let mut hydrated = Vec::with_capacity(orders.len());
    for pedido in orders {
        hydrated.push(hydrate(db, pedido, false).await?);
    }
    Ok(hydrated)
}

/// Deletes an order and its lines, unless an invoice was already emitted for it.
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let pedido = get_order_by_id(db, order_id)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;

    let invoiced = Invoice::find()
        .filter(invoice::Column::PedidoId.eq(order_id))
        .one(db)
        .await?;
    if invoiced.is_some() {
        return Err(Error::invalid_input(
            "Cannot delete an order that already has an invoice",
        ));
    }

    let txn = db.begin().await?;
    OrderLine::delete_many()
        .filter(order_line::Column::PedidoId.eq(order_id))
        .exec(&txn)
        .await?;
    pedido.delete(&txn).await?;
    txn.commit().await?;
    info!("Deleted order {order_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog::{ProductChanges, update_product};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    #[test]
    fn test_compute_totals_example() {
        let totals = compute_totals([(dec!(10.00), 2)]);
        assert_eq!(totals.subtotal, dec!(20.00));
        assert_eq!(totals.impuestos, dec!(2.60));
        assert_eq!(totals.total, dec!(22.60));
    }

    #[test]
    fn test_total_is_subtotal_plus_tax() {
        let lines = [(dec!(3.33), 3), (dec!(12.49), 1), (dec!(0.99), 7)];
        let totals = compute_totals(lines);
        assert_eq!(totals.subtotal, dec!(29.41));
        assert_eq!(totals.impuestos, totals.subtotal * dec!(0.13));
        assert_eq!(totals.total, totals.subtotal + totals.subtotal * dec!(0.13));
    }

    #[tokio::test]
    async fn test_create_order_requires_lines() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_order(&db, 1, NewOrder::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_order(
            &db,
            1,
            NewOrder {
                detalles: Some(Vec::new()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_with_empty_lines_writes_nothing() -> Result<()> {
        let ctx = setup_order_context().await?;
        let result = create_test_order(&ctx.db, ctx.seller.id, None, &[]).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        assert_eq!(Order::find().count(&ctx.db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_computes_totals_and_snapshots_price() -> Result<()> {
        let ctx = setup_order_context().await?;
        let detail = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 2)]).await?;

        assert_eq!(detail.pedido.subtotal, dec!(20.00));
        assert_eq!(detail.pedido.impuestos, dec!(2.60));
        assert_eq!(detail.pedido.total, dec!(22.60));
        assert_eq!(detail.pedido.metodo_pago, DEFAULT_PAYMENT_METHOD);
        assert!(!detail.pedido.stock_aplicado);
        assert_eq!(detail.estado.as_ref().unwrap().nombre, "Recibido");
        assert_eq!(detail.usuario.as_ref().unwrap().id, ctx.seller.id);

        let lines = detail.detalles.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].detalle.precio_unitario, dec!(10.00));
        assert_eq!(lines[0].detalle.subtotal, dec!(20.00));
        assert_eq!(lines[0].producto.as_ref().unwrap().id, ctx.product.id);

        // Later price changes do not touch the snapshot
        update_product(
            &ctx.db,
            ctx.product.id,
            ProductChanges {
                precio: Some(dec!(99.00)),
                ..Default::default()
            },
        )
        .await?;
        let reloaded = get_order_detail(&ctx.db, detail.pedido.id).await?;
        assert_eq!(reloaded.pedido.total, dec!(22.60));
        assert_eq!(
            reloaded.detalles.unwrap()[0].detalle.precio_unitario,
            dec!(10.00)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_defaults_quantity_to_one() -> Result<()> {
        let ctx = setup_order_context().await?;
        let detail = create_order(
            &ctx.db,
            ctx.seller.id,
            NewOrder {
                detalles: Some(vec![OrderLineInput {
                    producto_id: ctx.product.id,
                    cantidad: None,
                    instrucciones_especiales: Some("sin cebolla".to_string()),
                }]),
                metodo_pago: Some("Tarjeta".to_string()),
                ..Default::default()
            },
        )
        .await?;

        let lines = detail.detalles.unwrap();
        assert_eq!(lines[0].detalle.cantidad, 1);
        assert_eq!(
            lines[0].detalle.instrucciones_especiales.as_deref(),
            Some("sin cebolla")
        );
        assert_eq!(detail.pedido.metodo_pago, "Tarjeta");
        assert_eq!(detail.pedido.total, dec!(11.30));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_unknown_client_is_not_found() -> Result<()> {
        let ctx = setup_order_context().await?;
        let result =
            create_test_order(&ctx.db, ctx.seller.id, Some(999), &[(ctx.product.id, 1)]).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_unknown_or_inactive_product_is_invalid() -> Result<()> {
        let ctx = setup_order_context().await?;

        let result = create_test_order(&ctx.db, ctx.seller.id, None, &[(999, 1)]).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        update_product(
            &ctx.db,
            ctx.product.id,
            ProductChanges {
                activo: Some(false),
                ..Default::default()
            },
        )
        .await?;
        let result = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        assert_eq!(Order::find().count(&ctx.db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_whole_order() -> Result<()> {
        let ctx = setup_order_context().await?;
        // Second line references a missing product; the first one must not persist
        let result = create_test_order(
            &ctx.db,
            ctx.seller.id,
            None,
            &[(ctx.product.id, 1), (999, 1)],
        )
        .await;
        assert!(result.is_err());
        assert_eq!(Order::find().count(&ctx.db).await?, 0);
        assert_eq!(OrderLine::find().count(&ctx.db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_without_initial_status() -> Result<()> {
        let db = setup_test_db().await?;
        let seller = create_test_user(&db, "ana@example.com", crate::entities::Role::Seller).await?;
        let category = catalog::create_category(&db, "Pizzas", None).await?;
        let product = create_test_product(&db, "Margarita", dec!(10.00), category.id).await?;

        let result = create_test_order(&db, seller.id, None, &[(product.id, 1)]).await;
        assert!(matches!(
            result,
            Err(Error::InternalInvariantViolation { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_orders_filters_by_status() -> Result<()> {
        let ctx = setup_order_context().await?;
        let first = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await?;
        create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 3)]).await?;

        let all = list_orders(&ctx.db, OrderFilter::default()).await?;
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|o| o.detalles.is_none()));

        let preparing = status_by_kind(&ctx.db, crate::entities::StatusKind::Preparing).await?;
        crate::core::transition::transition_order(&ctx.db, first.pedido.id, preparing.id).await?;

        let filtered = list_orders(
            &ctx.db,
            OrderFilter {
                estado_id: Some(preparing.id),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].pedido.id, first.pedido.id);

        let future = list_orders(
            &ctx.db,
            OrderFilter {
                desde: Some(Utc::now() + chrono::TimeDelta::days(1)),
                ..Default::default()
            },
        )
        .await?;
        assert!(future.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_order() -> Result<()> {
        let ctx = setup_order_context().await?;
        let detail = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await?;

        delete_order(&ctx.db, detail.pedido.id).await?;
        assert!(get_order_by_id(&ctx.db, detail.pedido.id).await?.is_none());
        assert_eq!(OrderLine::find().count(&ctx.db).await?, 0);

        let result = delete_order(&ctx.db, detail.pedido.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_invoiced_order_cannot_be_deleted() -> Result<()> {
        let ctx = setup_order_context().await?;
        let detail = create_test_order(&ctx.db, ctx.seller.id, None, &[(ctx.product.id, 1)]).await?;
        crate::core::invoice::emit_invoice(&ctx.db, detail.pedido.id).await?;

        let result = delete_order(&ctx.db, detail.pedido.id).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        assert!(get_order_by_id(&ctx.db, detail.pedido.id).await?.is_some());
        Ok(())
    }
}
