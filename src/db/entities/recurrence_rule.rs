use base_entity_derive::base_entity;
use sea_orm::entity::prelude::*;

#[base_entity]
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "recurrence_rules")]
pub struct Model {
    #[sea_orm(unique)]
    pub task_id: Uuid,
    pub frequency: String,
    #[sea_orm(default_value = 1)]
    pub interval: i32,
    /// Comma separated weekday codes, e.g. `mon,wed,fri`.
    #[sea_orm(default_value = "")]
    pub days_of_week: String,
    pub day_of_month: Option<i32>,
    pub end_date: Option<DateTimeWithTimeZone>,
    /// Instances left in the series, counting the task that owns the rule.
    pub occurrences: Option<i32>,
    #[sea_orm(belongs_to, from = "task_id", to = "id", on_delete = "Cascade")]
    pub task: HasOne<super::task::Entity>,
}

impl Model {
    pub fn day_codes(&self) -> Vec<String> {
        self.days_of_week
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl ActiveModelBehavior for ActiveModel {}
