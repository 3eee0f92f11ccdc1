use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

// Append-only: rows are never updated.
#[base_entity(updated_at = "none")]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "task_histories")]
pub struct Model {
    #[sea_orm(indexed)]
    pub task_id: Uuid,
    pub action: String,
    pub completed_by: Option<Uuid>,
    pub completion_time: Option<DateTimeWithTimeZone>,
    pub notes: Option<String>,
    #[sea_orm(belongs_to, from = "task_id", to = "id", on_delete = "Cascade")]
    pub task: HasOne<super::task::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
