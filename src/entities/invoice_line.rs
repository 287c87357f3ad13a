//! Invoice line entity - Frozen copy of an order line at emission time.
//!
//! `descripcion` holds the product name as it was when the invoice was emitted,
//! so later catalog edits do not alter issued invoices.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice line database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "detalles_factura")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub factura_id: i64,
    /// Product the line came from, kept for reporting only
    pub producto_id: Option<i64>,
    pub descripcion: String,
    pub cantidad: i32,
    pub precio_unitario: Decimal,
    pub subtotal: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::FacturaId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
