//! `SeaORM` entity for the resource movements audit table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub resource_id: Uuid,
    pub amount: Decimal,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
    pub transaction_id: String,
    pub occurred_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resource_balances::Entity",
        from = "Column::ResourceId",
        to = "super::resource_balances::Column::Id"
    )]
    ResourceBalances,
}

impl Related<super::resource_balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceBalances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
