use uuid::Uuid;

use crate::{
    db::dao::{PaginatedResponse, TaskHistoryDao},
    db::entities::task_history,
    error::AppError,
    services::task_service::TaskService,
};

#[derive(Clone)]
pub struct HistoryService {
    tasks: TaskService,
    history: TaskHistoryDao,
}

impl HistoryService {
    pub fn new(tasks: TaskService, history: TaskHistoryDao) -> Self {
        Self { tasks, history }
    }

    pub async fn list(
        &self,
        caller: &Uuid,
        task_id: &Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<task_history::Model>, AppError> {
        self.tasks.require_visible(caller, task_id).await?;
        Ok(self.history.list_for_task(task_id, page, page_size).await?)
    }
}
