//! Stock consumption - decrements ingredient stock by an order's recipe needs.
//!
//! Consumption happens at most once per order, guarded by
//! `pedidos.stock_aplicado`. Each decrement computes the new level in
//! [`Decimal`] and writes it with a compare-and-set UPDATE, so stock never goes
//! negative and fractional quantities do not drift.

use crate::{
    entities::{Ingredient, Order, OrderLine, Recipe, ingredient, order, order_line, recipe},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Compare-and-set attempts before a decrement gives up with [`Error::Conflict`]
const MAX_DECREMENT_ATTEMPTS: usize = 5;

/// One applied stock decrement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockMovement {
    pub ingrediente_id: i64,
    pub producto_id: i64,
    pub cantidad: Decimal,
    /// Stock left after the decrement
    pub restante: Decimal,
}

/// Atomically subtracts `amount` from an ingredient's stock.
///
/// Reads the current level, checks and subtracts in [`Decimal`], then runs
/// `UPDATE ingredientes SET stock = new WHERE id = ? AND stock = old`. A
/// concurrent change makes the UPDATE match nothing and the read is retried.
/// Reports [`Error::InsufficientStock`] when the level is below `amount`.
pub async fn decrement_stock_atomic<C>(
    db: &C,
    ingredient_id: i64,
    amount: Decimal,
) -> Result<ingredient::Model>
where
    C: ConnectionTrait,
{
    for _ in 0..MAX_DECREMENT_ATTEMPTS {
        let current = Ingredient::find_by_id(ingredient_id)
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("Ingredient", ingredient_id))?;

        if current.stock < amount {
            return Err(Error::InsufficientStock {
                ingredient: current.nombre,
                available: current.stock,
                required: amount,
            });
        }

        let remaining = current.stock - amount;
        let now = Utc::now();
        let result = Ingredient::update_many()
            .col_expr(ingredient::Column::Stock, Expr::value(remaining))
            .col_expr(ingredient::Column::UpdatedAt, Expr::value(now))
            .filter(ingredient::Column::Id.eq(ingredient_id))
            .filter(ingredient::Column::Stock.eq(current.stock))
            .exec(db)
            .await?;

        if result.rows_affected == 1 {
            return Ok(ingredient::Model {
                stock: remaining,
                updated_at: now,
                ..current
            });
        }
        debug!("Stock of ingredient {ingredient_id} changed concurrently, retrying");
    }

    Err(Error::Conflict {
        message: format!("Stock of ingredient {ingredient_id} kept changing, try again"),
    })
}

/// Consumes ingredient stock for every line of an order, once.
///
/// For each line and each recipe entry of the line's product, subtracts
/// `recipe quantity × line quantity`. Returns an empty list when the order's
/// stock was already applied. The caller owns the transaction: on
/// [`Error::InsufficientStock`] it must roll back.
#[instrument(skip(db))]
pub async fn consume_stock_for_order<C>(db: &C, order_id: i64) -> Result<Vec<StockMovement>>
where
    C: ConnectionTrait,
{
    let pedido = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;

    if pedido.stock_aplicado {
        debug!("Stock already applied for order {order_id}, skipping");
        return Ok(Vec::new());
    }

    let lines = OrderLine::find()
        .filter(order_line::Column::PedidoId.eq(order_id))
        .all(db)
        .await?;

    let mut movements = Vec::new();
    for line in lines {
        let recipes = Recipe::find()
            .filter(recipe::Column::ProductoId.eq(line.producto_id))
            .all(db)
            .await?;

        for entry in recipes {
            let amount = entry.cantidad * Decimal::from(line.cantidad);
            let updated = decrement_stock_atomic(db, entry.ingrediente_id, amount).await?;
            movements.push(StockMovement {
                ingrediente_id: entry.ingrediente_id,
                producto_id: line.producto_id,
                cantidad: amount,
                restante: updated.stock,
            });
        }
    }

    Order::update_many()
        .col_expr(order::Column::StockAplicado, Expr::value(true))
        .filter(order::Column::Id.eq(order_id))
        .exec(db)
        .await?;

    info!(
        "Applied {} stock movement(s) for order {order_id}",
        movements.len()
    );
    Ok(movements)
}
