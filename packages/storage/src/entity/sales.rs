//! Manual SeaORM entity for sales records.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single sale. Flat leaf entity, no relations.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Store-generated on insert
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(indexed)]
    pub date: DateTimeUtc,

    #[sea_orm(column_type = "Text", indexed)]
    pub country: String,

    #[sea_orm(column_type = "Double")]
    pub total: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
