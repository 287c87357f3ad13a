//! Product entity - Sellable catalog items.
//!
//! Each product belongs to one category and carries the current unit price.
//! Orders snapshot that price into their lines, so editing a product never
//! changes existing orders or invoices.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productos")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown on menus and invoices
    pub nombre: String,
    /// Free-form description
    pub descripcion: Option<String>,
    /// Current unit price
    pub precio: Decimal,
    /// Estimated production cost per unit
    pub costo_estimado: Option<Decimal>,
    /// Picture shown by clients
    pub imagen_url: Option<String>,
    /// ID of the category this product belongs to
    pub categoria_id: i64,
    /// Inactive products cannot be ordered
    pub activo: bool,
    /// Whether the kitchen accepts customizations
    pub es_personalizable: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoriaId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// One product appears in many order lines
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLines,
    /// One product is made from many recipe entries
    #[sea_orm(has_many = "super::recipe::Entity")]
    Recipes,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
