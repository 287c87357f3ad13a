//! Invoice entity - Billing document emitted once per delivered order.
//!
//! Invoices are created by the status transition workflow only. Afterwards the
//! one permitted change is moving `estado` to [`InvoiceState::Annulled`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an invoice
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum InvoiceState {
    /// Emitted and settled
    #[sea_orm(string_value = "Pagada")]
    #[serde(rename = "Pagada")]
    Paid,
    /// Voided after emission
    #[sea_orm(string_value = "Anulada")]
    #[serde(rename = "Anulada")]
    Annulled,
}

impl InvoiceState {
    /// Parses the stored/display form ("Pagada", "Anulada").
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pagada" => Some(Self::Paid),
            "Anulada" => Some(Self::Annulled),
            _ => None,
        }
    }

    /// Display form used on documents
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "Pagada",
            Self::Annulled => "Anulada",
        }
    }
}

/// Invoice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "facturas")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this invoice bills; at most one invoice per order
    #[sea_orm(unique)]
    pub pedido_id: i64,
    /// Human-readable number, `FAC-<year>-<NNNN>`
    #[sea_orm(unique)]
    pub numero_factura: String,
    pub fecha_emision: DateTimeUtc,
    /// Emission date plus 30 days
    pub fecha_vencimiento: DateTimeUtc,
    pub estado: InvoiceState,
    pub subtotal: Decimal,
    pub impuestos: Decimal,
    pub total: Decimal,
    pub descuento: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invoice bills one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::PedidoId",
        to = "super::order::Column::Id"
    )]
    Order,
    /// One invoice has many lines
    #[sea_orm(has_many = "super::invoice_line::Entity")]
    Lines,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::invoice_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
