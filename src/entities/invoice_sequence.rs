//! Invoice sequence entity - One counter row per calendar year.
//!
//! `ultimo_numero` is the last sequence number handed out for `anio`; the next
//! invoice of that year takes `ultimo_numero + 1`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice sequence database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "secuencias_factura")]
pub struct Model {
    /// Calendar year the counter belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub anio: i32,
    /// Last number issued in this year
    pub ultimo_numero: i32,
    /// When the counter was last advanced
    pub updated_at: DateTimeUtc,
}

/// `InvoiceSequence` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
