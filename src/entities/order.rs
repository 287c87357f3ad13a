//! Order entity - A purchase request made of one or more order lines.
//!
//! Financial fields are computed once when the order is built and never
//! recomputed: `total = subtotal + impuestos`, with `impuestos` at 13%.
//! `stock_aplicado` records whether ingredient stock was already consumed
//! for this order, so the decrement runs at most once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pedidos")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Optional client the order is for
    pub cliente_id: Option<i64>,
    /// User who registered the order
    pub usuario_id: i64,
    /// Current status
    pub estado_id: i64,
    /// When the order was placed
    pub fecha_pedido: DateTimeUtc,
    /// When the order is expected to be delivered
    pub fecha_entrega: Option<DateTimeUtc>,
    pub direccion_entrega: Option<String>,
    pub telefono_contacto: Option<String>,
    pub notas: Option<String>,
    /// Sum of line subtotals
    pub subtotal: Decimal,
    /// Tax over the subtotal
    pub impuestos: Decimal,
    /// `subtotal + impuestos`
    pub total: Decimal,
    /// Payment method, "Efectivo" unless stated otherwise
    pub metodo_pago: String,
    /// Whether ingredient stock was already decremented for this order
    pub stock_aplicado: bool,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order may belong to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClienteId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// Each order is registered by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UsuarioId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each order references exactly one status
    #[sea_orm(
        belongs_to = "super::order_status::Entity",
        from = "Column::EstadoId",
        to = "super::order_status::Column::Id"
    )]
    Status,
    /// One order has many lines
    #[sea_orm(has_many = "super::order_line::Entity")]
    Lines,
    /// One order has at most one invoice
    #[sea_orm(has_one = "super::invoice::Entity")]
    Invoice,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Status.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
