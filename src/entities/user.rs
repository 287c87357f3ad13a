//! User entity - Business accounts that issue orders and operate the system.
//!
//! Every authenticated request resolves to one of these rows; its `rol`
//! decides which routes the caller may reach.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role attached to a user account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum Role {
    /// Full access, including catalog and user management
    #[sea_orm(string_value = "admin")]
    #[serde(rename = "admin")]
    Admin,
    /// Front-of-house staff taking orders
    #[sea_orm(string_value = "vendedor")]
    #[serde(rename = "vendedor")]
    Seller,
    /// Kitchen staff preparing orders
    #[sea_orm(string_value = "cocina")]
    #[serde(rename = "cocina")]
    Kitchen,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the account holder
    pub nombre: String,
    /// Tax identification number, unique per account
    #[sea_orm(unique)]
    pub nit: String,
    /// Taxpayer registration number
    pub nrc: Option<String>,
    /// Line of business
    pub giro: Option<String>,
    /// Login e-mail, unique per account
    #[sea_orm(unique)]
    pub correo: String,
    /// Contact phone
    pub telefono: String,
    /// Authorization role
    pub rol: Role,
    /// Argon2 PHC string; accounts without one can only use configured API tokens
    #[serde(skip)]
    pub contrasena: Option<String>,
    /// Disabled accounts are rejected by the auth layer
    pub activo: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user issues many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    /// One user holds many login sessions
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
