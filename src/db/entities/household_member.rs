use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

// A user joins a given household at most once.
#[base_entity(created_at = "joined_at", updated_at = "none")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "household_members")]
pub struct Model {
    #[sea_orm(unique_key = "membership")]
    pub user_id: Uuid,
    #[sea_orm(unique_key = "membership", indexed)]
    pub household_id: Uuid,
    #[sea_orm(default_value = "member")]
    pub role: String,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,
    #[sea_orm(belongs_to, from = "household_id", to = "id", on_delete = "Cascade")]
    pub household: HasOne<super::household::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
