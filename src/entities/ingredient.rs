//! Ingredient entity - Inventory items consumed by recipes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ingredient database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredientes")]
pub struct Model {
    /// Unique identifier for the ingredient
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique ingredient name
    #[sea_orm(unique)]
    pub nombre: String,
    pub descripcion: Option<String>,
    /// Quantity on hand, in `unidad_medida`
    pub stock: Decimal,
    /// Unit of measure (e.g. "kg", "unidad")
    pub unidad_medida: String,
    pub costo_por_unidad: Decimal,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One ingredient is used by many recipe entries
    #[sea_orm(has_many = "super::recipe::Entity")]
    Recipes,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
