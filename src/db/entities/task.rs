use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    pub title: String,
    pub description: Option<String>,
    #[sea_orm(default_value = false)]
    pub is_completed: bool,
    pub completed_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(indexed)]
    pub due_date: DateTimeWithTimeZone,
    pub estimated_minutes: Option<i32>,
    pub actual_minutes: Option<i32>,
    #[sea_orm(default_value = "medium")]
    pub priority: String,
    #[sea_orm(indexed)]
    pub user_id: Option<Uuid>,
    #[sea_orm(indexed)]
    pub category_id: Uuid,
    #[sea_orm(indexed)]
    pub household_id: Option<Uuid>,
    // Loose reference to a user; no foreign key.
    pub assigned_to_id: Option<Uuid>,
    // Self reference, enforced by the task service.
    #[sea_orm(indexed)]
    pub parent_task_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "SetNull")]
    pub user: HasOne<super::user::Entity>,
    #[sea_orm(belongs_to, from = "category_id", to = "id", on_delete = "Restrict")]
    pub category: HasOne<super::category::Entity>,
    #[sea_orm(belongs_to, from = "household_id", to = "id", on_delete = "Cascade")]
    pub household: HasOne<super::household::Entity>,
    #[sea_orm(has_one)]
    pub recurrence_rule: HasOne<super::recurrence_rule::Entity>,
    #[sea_orm(has_many)]
    pub history: HasMany<super::task_history::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
