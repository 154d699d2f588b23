use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product entity. Column names keep the store's original Spanish schema,
/// which is also the wire format.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "productos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Product name
    pub nombre: String,

    /// Free-form description
    pub descripcion: Option<String>,

    /// Unit price, never negative
    pub precio: Decimal,

    /// Sellable units on hand, never negative
    pub stock: i32,

    /// Category label (e.g. "camisas", "pantalones")
    pub categoria: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::venta::Entity")]
    Ventas,
}

impl Related<super::venta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ventas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
