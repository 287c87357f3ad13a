//! Order status transitions and the side effects bound to each target status.
//!
//! A transition, its stock consumption and its invoice emission commit or roll
//! back together. Orders whose current status is final cannot move.

use crate::{
    core::{
        invoice,
        order::{self, OrderDetail},
        status,
        stock::{self, StockMovement},
    },
    entities::{StatusKind, invoice as invoice_entity, order as order_entity},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// Work performed when an order enters a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Decrement ingredient stock by the order's recipe needs
    ConsumeStock,
    /// Emit the order's invoice if it has none
    EmitInvoice,
}

impl StatusKind {
    /// Side effects triggered by entering a status of this kind.
    #[must_use]
    pub const fn side_effects(self) -> &'static [SideEffect] {
        match self {
            Self::Preparing => &[SideEffect::ConsumeStock],
            Self::Delivered | Self::Completed => &[SideEffect::EmitInvoice],
            Self::Received | Self::Cancelled => &[],
        }
    }
}

/// Result of a successful transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    #[serde(flatten)]
    pub pedido: OrderDetail,
    /// Invoice of the order when one exists after the transition
    pub factura: Option<invoice_entity::Model>,
    #[serde(skip)]
    pub movimientos: Vec<StockMovement>,
}

/// Moves an order to `target_status_id` and runs the target's side effects.
///
/// # Errors
/// - [`Error::NotFound`] when the order does not exist
/// - [`Error::InvalidInput`] when the target status does not exist
/// - [`Error::InvalidTransition`] when the order is in a final status or already
///   in the target status
/// - [`Error::InsufficientStock`] when an ingredient cannot cover the order;
///   the status change is rolled back
#[instrument(skip(db))]
pub async fn transition_order(
    db: &DatabaseConnection,
    order_id: i64,
    target_status_id: i64,
) -> Result<TransitionOutcome> {
    let txn = db.begin().await?;

    let pedido = order::get_order_by_id(&txn, order_id)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;

    let target = status::get_status_by_id(&txn, target_status_id)
        .await?
        .ok_or_else(|| Error::invalid_input(format!("Invalid status {target_status_id}")))?;

    let current = status::get_status_by_id(&txn, pedido.estado_id)
        .await?
        .ok_or_else(|| Error::InternalInvariantViolation {
            message: format!(
                "Order {order_id} references missing status {}",
                pedido.estado_id
            ),
        })?;

    if current.es_final {
        return Err(Error::InvalidTransition {
            message: format!(
                "Cannot modify an order in a final status ({})",
                current.nombre
            ),
        });
    }
    if current.id == target.id {
        return Err(Error::InvalidTransition {
            message: format!("Order {order_id} is already in status {}", current.nombre),
        });
    }

    let mut active: order_entity::ActiveModel = pedido.into();
    active.estado_id = Set(target.id);
    active.update(&txn).await?;

    let mut movimientos = Vec::new();
    for effect in target.kind.side_effects() {
        match effect {
            SideEffect::ConsumeStock => {
                movimientos = stock::consume_stock_for_order(&txn, order_id).await?;
            }
            SideEffect::EmitInvoice => {
                invoice::emit_invoice_at(&txn, order_id, Utc::now()).await?;
            }
        }
    }

    let factura = invoice::get_invoice_for_order(&txn, order_id).await?;
    txn.commit().await?;

    info!(
        "Order {order_id} moved from '{}' to '{}'",
        current.nombre, target.nombre
    );

    let pedido = order::get_order_detail(db, order_id).await?;
    Ok(TransitionOutcome {
        pedido,
        factura,
        movimientos,
    })
}
