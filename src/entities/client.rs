//! Client entity - Optional customer attached to an order.
//!
//! The national ID (`dui`) is unique and stored normalized as `########-#`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clientes")]
pub struct Model {
    /// Unique identifier for the client
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub nombre: String,
    /// National ID in `########-#` form
    #[sea_orm(unique)]
    pub dui: Option<String>,
    /// Postal address
    pub direccion: Option<String>,
    /// Phone number with whitespace stripped
    pub telefono: Option<String>,
    /// When the client was registered
    pub created_at: DateTimeUtc,
    /// When the client was last modified
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One client places many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
