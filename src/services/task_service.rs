use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::{
    config::TasksConfig,
    db::dao::{
        CategoryScope, Completion, CompletionOutcome, DaoBase, NewTask, PaginatedResponse,
        RecurrenceRuleDao, TaskChanges, TaskDao, TaskFilter, TaskVisibility,
    },
    db::entities::{recurrence_rule, task},
    domain::TaskPriority,
    error::AppError,
    services::{category_service::CategoryService, membership::Membership},
};

#[derive(Debug, Clone)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<FixedOffset>,
    pub estimated_minutes: Option<i32>,
    pub priority: Option<TaskPriority>,
    pub category_id: Uuid,
    pub household_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct TaskDetail {
    pub task: task::Model,
    pub subtasks: Vec<task::Model>,
    pub recurrence: Option<recurrence_rule::Model>,
}

#[derive(Clone)]
pub struct TaskService {
    tasks: TaskDao,
    rules: RecurrenceRuleDao,
    categories: CategoryService,
    membership: Membership,
    config: TasksConfig,
}

impl TaskService {
    pub fn new(
        tasks: TaskDao,
        rules: RecurrenceRuleDao,
        categories: CategoryService,
        membership: Membership,
        config: TasksConfig,
    ) -> Self {
        Self {
            tasks,
            rules,
            categories,
            membership,
            config,
        }
    }

    pub async fn visibility(&self, caller: &Uuid) -> Result<TaskVisibility, AppError> {
        Ok(TaskVisibility {
            user_id: *caller,
            household_ids: self.membership.household_ids(caller).await?,
        })
    }

    /// Tasks outside the caller's reach look missing rather than forbidden.
    pub async fn require_visible(&self, caller: &Uuid, id: &Uuid) -> Result<task::Model, AppError> {
        let not_found = || AppError::not_found("Task not found");
        let task = self
            .tasks
            .find_optional_by_id(*id)
            .await?
            .ok_or_else(not_found)?;
        if !self.visibility(caller).await?.allows(&task) {
            return Err(not_found());
        }
        Ok(task)
    }

    pub async fn create(&self, caller: &Uuid, input: TaskInput) -> Result<task::Model, AppError> {
        let title = task_title(&input.title)?;
        check_minutes("estimated_minutes", input.estimated_minutes)?;
        if let Some(household_id) = input.household_id {
            self.membership.role_of(&household_id, caller).await?;
        }
        self.check_category(caller, &input.category_id, input.household_id)
            .await?;
        self.check_assignee(caller, input.household_id, input.assigned_to_id)
            .await?;
        if let Some(parent_id) = input.parent_task_id {
            let parent = self.require_visible(caller, &parent_id).await?;
            if parent.household_id != input.household_id {
                return Err(AppError::bad_request(
                    "A subtask must belong to the same household as its parent",
                ));
            }
            self.check_depth(&parent_id, None).await?;
        }

        let task = self
            .tasks
            .create_task(NewTask {
                title,
                description: input.description,
                due_date: input.due_date,
                estimated_minutes: input.estimated_minutes,
                priority: input.priority.unwrap_or_default(),
                user_id: Some(*caller),
                category_id: input.category_id,
                household_id: input.household_id,
                assigned_to_id: input.assigned_to_id,
                parent_task_id: input.parent_task_id,
            })
            .await?;
        tracing::info!(task_id = %task.id, household_id = ?task.household_id, "created task");
        Ok(task)
    }

    pub async fn get(&self, caller: &Uuid, id: &Uuid) -> Result<TaskDetail, AppError> {
        let task = self.require_visible(caller, id).await?;
        let subtasks = self.tasks.children(id).await?;
        let recurrence = self.rules.find_by_task(id).await?;
        Ok(TaskDetail {
            task,
            subtasks,
            recurrence,
        })
    }

    pub async fn list(
        &self,
        caller: &Uuid,
        filter: TaskFilter,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<task::Model>, AppError> {
        if let Some(household_id) = filter.household_id {
            self.membership.role_of(&household_id, caller).await?;
        }
        let visibility = self.visibility(caller).await?;
        Ok(self
            .tasks
            .list_tasks(&visibility, &filter, page, page_size)
            .await?)
    }

    pub async fn update(
        &self,
        caller: &Uuid,
        id: &Uuid,
        mut changes: TaskChanges,
    ) -> Result<task::Model, AppError> {
        let task = self.require_visible(caller, id).await?;

        if let Some(title) = changes.title.as_deref() {
            changes.title = Some(task_title(title)?);
        }
        if let Some(estimated) = changes.estimated_minutes {
            check_minutes("estimated_minutes", estimated)?;
        }
        if let Some(category_id) = changes.category_id {
            self.check_category(caller, &category_id, task.household_id)
                .await?;
        }
        if let Some(assignee) = changes.assigned_to_id {
            self.check_assignee(caller, task.household_id, assignee)
                .await?;
        }
        if let Some(Some(parent_id)) = changes.parent_task_id {
            if parent_id == task.id {
                return Err(AppError::bad_request("A task cannot be its own parent"));
            }
            let parent = self.require_visible(caller, &parent_id).await?;
            if parent.household_id != task.household_id {
                return Err(AppError::bad_request(
                    "A subtask must belong to the same household as its parent",
                ));
            }
            self.check_depth(&parent_id, Some(&task.id)).await?;
        }

        let updated = self.tasks.update_task(id, changes).await?;
        tracing::info!(task_id = %id, "updated task");
        Ok(updated)
    }

    pub async fn delete(&self, caller: &Uuid, id: &Uuid) -> Result<u64, AppError> {
        self.require_visible(caller, id).await?;
        let removed = self.tasks.delete_subtree(id).await?;
        tracing::info!(task_id = %id, removed, "deleted task subtree");
        Ok(removed)
    }

    pub async fn complete(
        &self,
        caller: &Uuid,
        id: &Uuid,
        actual_minutes: Option<i32>,
        notes: Option<String>,
    ) -> Result<CompletionOutcome, AppError> {
        self.require_visible(caller, id).await?;
        check_minutes("actual_minutes", actual_minutes)?;

        let outcome = self
            .tasks
            .complete(
                id,
                Completion {
                    completed_by: *caller,
                    at: Utc::now().fixed_offset(),
                    actual_minutes,
                    notes,
                },
            )
            .await?;
        match &outcome.successor {
            Some(successor) => tracing::info!(
                task_id = %id,
                successor_id = %successor.id,
                due_date = %successor.due_date,
                "completed recurring task"
            ),
            None => tracing::info!(task_id = %id, "completed task"),
        }
        Ok(outcome)
    }

    pub async fn reopen(
        &self,
        caller: &Uuid,
        id: &Uuid,
        notes: Option<String>,
    ) -> Result<task::Model, AppError> {
        self.require_visible(caller, id).await?;
        let task = self.tasks.reopen(id, notes).await?;
        tracing::info!(task_id = %id, "reopened task");
        Ok(task)
    }

    async fn check_category(
        &self,
        caller: &Uuid,
        category_id: &Uuid,
        household_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let category = self
            .categories
            .require_usable(caller, category_id)
            .await
            .map_err(|err| match err {
                AppError::NotFound(_) | AppError::Forbidden(_) => {
                    AppError::bad_request("Unknown category")
                }
                other => other,
            })?;
        if let CategoryScope::Household(owner) = CategoryScope::of(&category) {
            if household_id != Some(owner) {
                return Err(AppError::bad_request(
                    "Category belongs to a different household",
                ));
            }
        }
        Ok(())
    }

    async fn check_assignee(
        &self,
        caller: &Uuid,
        household_id: Option<Uuid>,
        assignee: Option<Uuid>,
    ) -> Result<(), AppError> {
        let Some(assignee) = assignee else {
            return Ok(());
        };
        match household_id {
            Some(household_id) => self
                .membership
                .role_of(&household_id, &assignee)
                .await
                .map(|_| ())
                .map_err(|_| AppError::bad_request("Assignee is not a member of this household")),
            None if assignee == *caller => Ok(()),
            None => Err(AppError::bad_request(
                "Personal tasks can only be assigned to their owner",
            )),
        }
    }

    /// Rejects a parent whose chain already contains `moving`, or one that
    /// would push the deepest task below it past the nesting limit. A moved
    /// task brings its whole subtree along.
    async fn check_depth(&self, parent_id: &Uuid, moving: Option<&Uuid>) -> Result<(), AppError> {
        let max_depth = self.config.max_tree_depth as usize;
        let chain = self.tasks.ancestor_ids(parent_id, max_depth + 1).await?;
        let height = match moving {
            Some(moving) => {
                if chain.contains(moving) {
                    return Err(AppError::bad_request(
                        "Moving the task there would create a cycle",
                    ));
                }
                self.tasks.subtree_height(moving).await?
            }
            None => 1,
        };
        // The new child sits `chain.len()` levels below the root.
        if chain.len() + height - 1 > max_depth {
            return Err(AppError::bad_request(format!(
                "Subtasks may nest at most {max_depth} levels deep"
            )));
        }
        Ok(())
    }
}

fn task_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("Title must not be empty"));
    }
    Ok(title.to_string())
}

fn check_minutes(field: &str, minutes: Option<i32>) -> Result<(), AppError> {
    match minutes {
        Some(value) if value < 0 => Err(AppError::bad_request(format!(
            "{field} must not be negative"
        ))),
        _ => Ok(()),
    }
}
