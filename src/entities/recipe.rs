//! Recipe entity - Join between products and the ingredients they consume.
//!
//! `cantidad` is the amount of the ingredient needed for one unit of product.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recipe database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recetas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub producto_id: i64,
    pub ingrediente_id: i64,
    /// Ingredient quantity required per unit of product
    pub cantidad: Decimal,
    pub instrucciones: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductoId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::ingredient::Entity",
        from = "Column::IngredienteId",
        to = "super::ingredient::Column::Id"
    )]
    Ingredient,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
