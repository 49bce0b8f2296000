//! `SeaORM` entity for the resource balances table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource_movements::Entity")]
    ResourceMovements,
}

impl Related<super::resource_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
