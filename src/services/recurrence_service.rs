use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::{
    config::TasksConfig,
    db::dao::RecurrenceRuleDao,
    db::entities::recurrence_rule,
    error::AppError,
    recurrence::{Frequency, RecurrencePattern},
    services::task_service::TaskService,
};

#[derive(Debug, Clone)]
pub struct RecurrenceInput {
    pub frequency: String,
    pub interval: Option<i64>,
    pub days_of_week: Vec<String>,
    pub day_of_month: Option<i64>,
    pub end_date: Option<DateTime<FixedOffset>>,
    pub occurrences: Option<i64>,
}

impl RecurrenceInput {
    fn pattern(&self) -> Result<RecurrencePattern, AppError> {
        let frequency: Frequency = self.frequency.parse()?;
        Ok(RecurrencePattern::new(
            frequency,
            self.interval.unwrap_or(1),
            &self.days_of_week,
            self.day_of_month,
            self.end_date,
            self.occurrences,
        )?)
    }
}

#[derive(Clone)]
pub struct RecurrenceService {
    tasks: TaskService,
    rules: RecurrenceRuleDao,
    config: TasksConfig,
}

impl RecurrenceService {
    pub fn new(tasks: TaskService, rules: RecurrenceRuleDao, config: TasksConfig) -> Self {
        Self {
            tasks,
            rules,
            config,
        }
    }

    pub async fn get(
        &self,
        caller: &Uuid,
        task_id: &Uuid,
    ) -> Result<recurrence_rule::Model, AppError> {
        self.tasks.require_visible(caller, task_id).await?;
        self.require_rule(task_id).await
    }

    /// Creates or replaces the rule. Monthly and yearly rules are pinned to the
    /// due date's day when none is given.
    pub async fn set(
        &self,
        caller: &Uuid,
        task_id: &Uuid,
        input: RecurrenceInput,
    ) -> Result<recurrence_rule::Model, AppError> {
        let task = self.tasks.require_visible(caller, task_id).await?;
        if task.is_completed {
            return Err(AppError::conflict(
                "Recurrence can only be set on an open task",
            ));
        }

        let pattern = input.pattern()?.anchored_to(task.due_date);
        let rule = self.rules.upsert_for_task(task_id, &pattern).await?;
        tracing::info!(
            task_id = %task_id,
            frequency = pattern.frequency().as_str(),
            interval = pattern.interval(),
            "saved recurrence rule"
        );
        Ok(rule)
    }

    pub async fn remove(&self, caller: &Uuid, task_id: &Uuid) -> Result<(), AppError> {
        self.tasks.require_visible(caller, task_id).await?;
        if !self.rules.delete_by_task(task_id).await? {
            return Err(AppError::not_found("Task has no recurrence rule"));
        }
        tracing::info!(task_id = %task_id, "removed recurrence rule");
        Ok(())
    }

    /// Upcoming due dates, starting with the task's own.
    pub async fn preview(
        &self,
        caller: &Uuid,
        task_id: &Uuid,
        count: u32,
    ) -> Result<Vec<DateTime<FixedOffset>>, AppError> {
        if count == 0 || count > self.config.max_preview {
            return Err(AppError::bad_request(format!(
                "count must be between 1 and {}",
                self.config.max_preview
            )));
        }
        let task = self.tasks.require_visible(caller, task_id).await?;
        let rule = self.require_rule(task_id).await?;
        let pattern = RecurrencePattern::from_rule(&rule)?;
        Ok(pattern
            .occurrences_from(task.due_date)
            .take(count as usize)
            .collect())
    }

    async fn require_rule(&self, task_id: &Uuid) -> Result<recurrence_rule::Model, AppError> {
        self.rules
            .find_by_task(task_id)
            .await?
            .ok_or_else(|| AppError::not_found("Task has no recurrence rule"))
    }
}
