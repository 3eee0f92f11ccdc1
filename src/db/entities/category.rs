use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

// Names are unique per owning scope. `scope` mirrors the owner columns as a
// non-null key ("household:<id>", "user:<id>" or "shared") so the database
// can index it; nullable owner columns never collide in a unique index.
#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(unique_key = "scoped_name", indexed)]
    pub name: String,
    #[sea_orm(unique_key = "scoped_name")]
    pub scope: String,
    pub emoji: Option<String>,
    pub color: Option<String>,
    #[sea_orm(indexed)]
    pub user_id: Option<Uuid>,
    #[sea_orm(indexed)]
    pub household_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,
    #[sea_orm(belongs_to, from = "household_id", to = "id", on_delete = "Cascade")]
    pub household: HasOne<super::household::Entity>,
    #[sea_orm(has_many)]
    pub tasks: HasMany<super::task::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
