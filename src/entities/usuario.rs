use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Database-backed user account. The bootstrap operator credential lives in
/// configuration and never appears in this table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub usuario: String,

    /// Argon2 hash; a row may predate credential setup and carry none
    #[serde(skip_serializing)]
    pub contrasena_hash: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
