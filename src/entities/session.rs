//! Session entity - Bearer tokens issued by `POST /login`.
//!
//! A row lives until its owner logs out or `expires_at` passes; expired rows
//! are purged on the next login.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sesiones")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque token presented as `Authorization: Bearer <token>`
    #[sea_orm(unique)]
    pub token: String,
    pub usuario_id: i64,
    pub created_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UsuarioId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
