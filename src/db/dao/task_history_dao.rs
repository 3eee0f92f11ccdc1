use chrono::{DateTime, FixedOffset};
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult, PaginatedResponse};
use crate::db::entities::{prelude::TaskHistory, task_history};
use crate::domain::HistoryAction;

#[derive(Clone)]
pub struct TaskHistoryDao {
    db: DatabaseConnection,
}

impl DaoBase for TaskHistoryDao {
    type Entity = TaskHistory;
    const ENTITY_NAME: &'static str = "task history";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryEntry {
    pub completed_by: Option<Uuid>,
    pub completion_time: Option<DateTime<FixedOffset>>,
    pub notes: Option<String>,
}

pub fn history_values(
    task_id: Uuid,
    action: HistoryAction,
    entry: HistoryEntry,
) -> task_history::ActiveModel {
    task_history::ActiveModel {
        task_id: Set(task_id),
        action: Set(action.as_str().to_string()),
        completed_by: Set(entry.completed_by),
        completion_time: Set(entry.completion_time),
        notes: Set(entry.notes),
        ..Default::default()
    }
}

impl TaskHistoryDao {
    pub async fn record(
        &self,
        task_id: &Uuid,
        action: HistoryAction,
        entry: HistoryEntry,
    ) -> DaoResult<task_history::Model> {
        self.create(history_values(*task_id, action, entry)).await
    }

    /// Newest first.
    pub async fn list_for_task(
        &self,
        task_id: &Uuid,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<task_history::Model>> {
        let task_id = *task_id;
        self.find(page, page_size, None, move |query| {
            query.filter(task_history::Column::TaskId.eq(task_id))
        })
        .await
    }
}
