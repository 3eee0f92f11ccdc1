use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "households")]
pub struct Model {
    pub name: String,
    pub description: Option<String>,
    #[sea_orm(has_many)]
    pub categories: HasMany<super::category::Entity>,
    #[sea_orm(has_many)]
    pub members: HasMany<super::household_member::Entity>,
    #[sea_orm(has_many)]
    pub tasks: HasMany<super::task::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
