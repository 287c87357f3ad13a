//! Order line entity - One product quantity within an order.
//!
//! Lines are written together with their order and never updated; the unit
//! price is a snapshot of the product price at order time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order line database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "detalles_pedido")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub pedido_id: i64,
    pub producto_id: i64,
    /// Units ordered
    pub cantidad: i32,
    /// Product price when the order was placed
    pub precio_unitario: Decimal,
    /// `precio_unitario * cantidad`
    pub subtotal: Decimal,
    pub instrucciones_especiales: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::PedidoId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductoId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
