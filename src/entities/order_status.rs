//! Order status entity - The named states an order moves through.
//!
//! Display names are free text; behaviour hangs off `kind`, and `es_final`
//! marks statuses from which an order can no longer be transitioned.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Behavioural kind of an order status, independent of its display name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Order accepted, nothing prepared yet
    #[sea_orm(string_value = "received")]
    Received,
    /// Kitchen is preparing the order; ingredients are consumed
    #[sea_orm(string_value = "preparing")]
    Preparing,
    /// Order handed over to the client; an invoice is emitted
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Order closed; an invoice is emitted
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Order abandoned
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl StatusKind {
    /// Default terminal flag used when seeding a status of this kind.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Order status database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "estados_pedido")]
pub struct Model {
    /// Unique identifier for the status
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g. "Recibido", "En Preparación")
    #[sea_orm(unique)]
    pub nombre: String,
    pub descripcion: Option<String>,
    /// Behaviour selector for side effects
    pub kind: StatusKind,
    /// Orders in a final status are locked
    pub es_final: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
