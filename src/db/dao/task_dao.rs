use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IntoActiveModel, Order, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use super::task_history_dao::{HistoryEntry, history_values};
use super::{
    ColumnFilter, CompareOp, DaoBase, DaoLayerError, DaoResult, PaginatedResponse,
    TimestampedActiveModel, stamp_new,
};
use crate::db::entities::prelude::{RecurrenceRule, Task};
use crate::db::entities::{recurrence_rule, task};
use crate::domain::{HistoryAction, TaskPriority};
use crate::recurrence::RecurrencePattern;

#[derive(Clone)]
pub struct TaskDao {
    db: DatabaseConnection,
}

impl DaoBase for TaskDao {
    type Entity = Task;
    const ENTITY_NAME: &'static str = "task";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<FixedOffset>,
    pub estimated_minutes: Option<i32>,
    pub priority: TaskPriority,
    pub user_id: Option<Uuid>,
    pub category_id: Uuid,
    pub household_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
}

impl NewTask {
    fn into_values(self) -> task::ActiveModel {
        task::ActiveModel {
            title: Set(self.title),
            description: Set(self.description),
            is_completed: Set(false),
            completed_at: Set(None),
            due_date: Set(self.due_date),
            estimated_minutes: Set(self.estimated_minutes),
            actual_minutes: Set(None),
            priority: Set(self.priority.as_str().to_string()),
            user_id: Set(self.user_id),
            category_id: Set(self.category_id),
            household_id: Set(self.household_id),
            assigned_to_id: Set(self.assigned_to_id),
            parent_task_id: Set(self.parent_task_id),
            ..Default::default()
        }
    }

    /// Next instance of a series: same fields, new due date, not completed.
    fn successor_of(task: &task::Model, due_date: DateTime<FixedOffset>) -> DaoResult<Self> {
        let priority = TaskPriority::try_from(task.priority.as_str()).map_err(|err| {
            DaoLayerError::Db(DbErr::Custom(format!(
                "stored priority of task {} is invalid: {err}",
                task.id
            )))
        })?;
        Ok(Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date,
            estimated_minutes: task.estimated_minutes,
            priority,
            user_id: task.user_id,
            category_id: task.category_id,
            household_id: task.household_id,
            assigned_to_id: task.assigned_to_id,
            parent_task_id: task.parent_task_id,
        })
    }
}

/// Partial update. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<DateTime<FixedOffset>>,
    pub estimated_minutes: Option<Option<i32>>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<Uuid>,
    pub assigned_to_id: Option<Option<Uuid>>,
    pub parent_task_id: Option<Option<Uuid>>,
}

impl TaskChanges {
    fn apply(self, active: &mut task::ActiveModel) {
        if let Some(title) = self.title {
            active.title = Set(title);
        }
        if let Some(description) = self.description {
            active.description = Set(description);
        }
        if let Some(due_date) = self.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(estimated_minutes) = self.estimated_minutes {
            active.estimated_minutes = Set(estimated_minutes);
        }
        if let Some(priority) = self.priority {
            active.priority = Set(priority.as_str().to_string());
        }
        if let Some(category_id) = self.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(assigned_to_id) = self.assigned_to_id {
            active.assigned_to_id = Set(assigned_to_id);
        }
        if let Some(parent_task_id) = self.parent_task_id {
            active.parent_task_id = Set(parent_task_id);
        }
    }
}

/// Household tasks are visible to members, personal tasks to their owner.
#[derive(Debug, Clone)]
pub struct TaskVisibility {
    pub user_id: Uuid,
    pub household_ids: Vec<Uuid>,
}

impl TaskVisibility {
    pub fn allows(&self, task: &task::Model) -> bool {
        match task.household_id {
            Some(household_id) => self.household_ids.contains(&household_id),
            None => task.user_id == Some(self.user_id),
        }
    }

    fn condition(&self) -> Condition {
        Condition::any()
            .add(task::Column::HouseholdId.is_in(self.household_ids.clone()))
            .add(
                Condition::all()
                    .add(task::Column::HouseholdId.is_null())
                    .add(task::Column::UserId.eq(self.user_id)),
            )
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub household_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub completed: Option<bool>,
    pub due_before: Option<DateTime<FixedOffset>>,
    pub due_after: Option<DateTime<FixedOffset>>,
    pub parent_task_id: Option<Uuid>,
    pub top_level_only: bool,
}

impl TaskFilter {
    fn column_filters(&self) -> Vec<ColumnFilter<task::Column>> {
        let mut filters = Vec::new();
        if let Some(household_id) = self.household_id {
            filters.push(ColumnFilter::eq(task::Column::HouseholdId, household_id));
        }
        if let Some(category_id) = self.category_id {
            filters.push(ColumnFilter::eq(task::Column::CategoryId, category_id));
        }
        if let Some(completed) = self.completed {
            filters.push(ColumnFilter::eq(task::Column::IsCompleted, completed));
        }
        if let Some(due_before) = self.due_before {
            filters.push(ColumnFilter::compare(
                task::Column::DueDate,
                CompareOp::Lt,
                due_before,
            ));
        }
        if let Some(due_after) = self.due_after {
            filters.push(ColumnFilter::compare(
                task::Column::DueDate,
                CompareOp::Gt,
                due_after,
            ));
        }
        if let Some(parent_task_id) = self.parent_task_id {
            filters.push(ColumnFilter::eq(task::Column::ParentTaskId, parent_task_id));
        } else if self.top_level_only {
            filters.push(ColumnFilter::is_null(task::Column::ParentTaskId));
        }
        filters
    }
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub completed_by: Uuid,
    pub at: DateTime<FixedOffset>,
    pub actual_minutes: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub task: task::Model,
    pub successor: Option<task::Model>,
}

impl TaskDao {
    pub async fn create_task(&self, new: NewTask) -> DaoResult<task::Model> {
        let txn = self.db.begin().await?;
        let task = stamp_new(new.into_values()).insert(&txn).await?;
        stamp_new(history_values(
            task.id,
            HistoryAction::Created,
            HistoryEntry::default(),
        ))
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok(task)
    }

    pub async fn update_task(&self, id: &Uuid, changes: TaskChanges) -> DaoResult<task::Model> {
        let txn = self.db.begin().await?;
        let mut active = find_in(&txn, *id).await?.into_active_model();
        changes.apply(&mut active);
        active.set_updated_at(Utc::now().fixed_offset());
        let task = active.update(&txn).await?;
        stamp_new(history_values(
            task.id,
            HistoryAction::Updated,
            HistoryEntry::default(),
        ))
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok(task)
    }

    pub async fn list_tasks(
        &self,
        visibility: &TaskVisibility,
        filter: &TaskFilter,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<task::Model>> {
        let visible = visibility.condition();
        self.find_with_filters(
            page,
            page_size,
            Some((task::Column::DueDate, Order::Asc)),
            &filter.column_filters(),
            move |query| query.filter(visible),
        )
        .await
    }

    pub async fn children(&self, parent_id: &Uuid) -> DaoResult<Vec<task::Model>> {
        let parent_id = *parent_id;
        self.find_iter(
            None,
            Some((task::Column::DueDate, Order::Asc)),
            move |query| query.filter(task::Column::ParentTaskId.eq(parent_id)),
        )
        .collect_all()
        .await
    }

    /// `start` followed by its ancestors, root last. Stops after `limit`
    /// entries or when an id repeats.
    pub async fn ancestor_ids(&self, start: &Uuid, limit: usize) -> DaoResult<Vec<Uuid>> {
        let mut chain = Vec::new();
        let mut next = Some(*start);
        while let Some(id) = next {
            if chain.len() >= limit || chain.contains(&id) {
                break;
            }
            let task = self.find_by_id(id).await?;
            chain.push(id);
            next = task.parent_task_id;
        }
        Ok(chain)
    }

    /// Levels in the subtree rooted at `root`, the root itself included.
    pub async fn subtree_height(&self, root: &Uuid) -> DaoResult<usize> {
        let mut seen = vec![*root];
        let mut frontier = vec![*root];
        let mut height = 0;
        while !frontier.is_empty() {
            height += 1;
            let children: Vec<Uuid> = Task::find()
                .filter(task::Column::ParentTaskId.is_in(frontier))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|child| child.id)
                .filter(|id| !seen.contains(id))
                .collect();
            seen.extend(children.iter().copied());
            frontier = children;
        }
        Ok(height)
    }

    pub async fn count_for_category(&self, category_id: &Uuid) -> DaoResult<u64> {
        Task::find()
            .filter(task::Column::CategoryId.eq(*category_id))
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Deletes the task and every descendant. Returns the number of rows.
    pub async fn delete_subtree(&self, root_id: &Uuid) -> DaoResult<u64> {
        let txn = self.db.begin().await?;
        find_in(&txn, *root_id).await?;

        let mut doomed = vec![*root_id];
        let mut frontier = vec![*root_id];
        while !frontier.is_empty() {
            let children: Vec<Uuid> = Task::find()
                .filter(task::Column::ParentTaskId.is_in(frontier))
                .all(&txn)
                .await?
                .into_iter()
                .map(|child| child.id)
                .filter(|id| !doomed.contains(id))
                .collect();
            doomed.extend(children.iter().copied());
            frontier = children;
        }

        let result = Task::delete_many()
            .filter(task::Column::Id.is_in(doomed))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(result.rows_affected)
    }

    /// Marks the task completed and, when its rule still has instances left,
    /// creates the successor and moves the rule onto it. The completion flag
    /// is flipped with a conditional update, so of two racing callers only
    /// one gets past it and spawns.
    pub async fn complete(&self, id: &Uuid, completion: Completion) -> DaoResult<CompletionOutcome> {
        const ALREADY_COMPLETED: &str = "is already completed";

        let txn = self.db.begin().await?;
        if find_in(&txn, *id).await?.is_completed {
            return Err(Self::conflict(id, ALREADY_COMPLETED));
        }
        let claim = task::ActiveModel {
            is_completed: Set(true),
            completed_at: Set(Some(completion.at)),
            actual_minutes: Set(completion.actual_minutes),
            ..Default::default()
        };
        if !claim_in(&txn, *id, false, claim).await? {
            return Err(Self::conflict(id, ALREADY_COMPLETED));
        }
        let task = find_in(&txn, *id).await?;
        let rule = RecurrenceRule::find()
            .filter(recurrence_rule::Column::TaskId.eq(*id))
            .one(&txn)
            .await?;

        stamp_new(history_values(
            task.id,
            HistoryAction::Completed,
            HistoryEntry {
                completed_by: Some(completion.completed_by),
                completion_time: Some(completion.at),
                notes: completion.notes,
            },
        ))
        .insert(&txn)
        .await?;

        let successor = match rule {
            Some(rule) => spawn_successor(&txn, &task, rule).await?,
            None => None,
        };

        txn.commit().await?;
        Ok(CompletionOutcome { task, successor })
    }

    pub async fn reopen(&self, id: &Uuid, notes: Option<String>) -> DaoResult<task::Model> {
        const NOT_COMPLETED: &str = "is not completed";

        let txn = self.db.begin().await?;
        if !find_in(&txn, *id).await?.is_completed {
            return Err(Self::conflict(id, NOT_COMPLETED));
        }
        let claim = task::ActiveModel {
            is_completed: Set(false),
            completed_at: Set(None),
            actual_minutes: Set(None),
            ..Default::default()
        };
        if !claim_in(&txn, *id, true, claim).await? {
            return Err(Self::conflict(id, NOT_COMPLETED));
        }
        let task = find_in(&txn, *id).await?;

        stamp_new(history_values(
            task.id,
            HistoryAction::Reopened,
            HistoryEntry {
                notes,
                ..Default::default()
            },
        ))
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok(task)
    }

    fn conflict(id: &Uuid, reason: &'static str) -> DaoLayerError {
        DaoLayerError::Conflict {
            entity: Self::ENTITY_NAME,
            id: *id,
            reason,
        }
    }
}

/// Applies `values` only while the row's completion flag is still `from`.
/// Returns whether this caller won the row.
async fn claim_in(
    txn: &DatabaseTransaction,
    id: Uuid,
    from: bool,
    mut values: task::ActiveModel,
) -> DaoResult<bool> {
    values.set_updated_at(Utc::now().fixed_offset());
    let result = Task::update_many()
        .set(values)
        .filter(task::Column::Id.eq(id))
        .filter(task::Column::IsCompleted.eq(from))
        .exec(txn)
        .await?;
    Ok(result.rows_affected > 0)
}

async fn find_in(txn: &DatabaseTransaction, id: Uuid) -> DaoResult<task::Model> {
    Task::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(DaoLayerError::NotFound {
            entity: TaskDao::ENTITY_NAME,
            id,
        })
}

async fn spawn_successor(
    txn: &DatabaseTransaction,
    task: &task::Model,
    rule: recurrence_rule::Model,
) -> DaoResult<Option<task::Model>> {
    let pattern = RecurrencePattern::from_rule(&rule).map_err(|err| {
        DaoLayerError::Db(DbErr::Custom(format!(
            "stored recurrence rule {} is invalid: {err}",
            rule.id
        )))
    })?;
    let Some(next) = pattern.successor(task.due_date) else {
        return Ok(None);
    };

    let successor = stamp_new(NewTask::successor_of(task, next.due_date)?.into_values())
        .insert(txn)
        .await?;

    let mut moved = rule.into_active_model();
    moved.task_id = Set(successor.id);
    moved.occurrences = Set(next
        .occurrences
        .map(|count| i32::try_from(count).unwrap_or(i32::MAX)));
    moved.set_updated_at(Utc::now().fixed_offset());
    moved.update(txn).await?;

    stamp_new(history_values(
        successor.id,
        HistoryAction::Generated,
        HistoryEntry {
            notes: Some(format!("Generated from task {}", task.id)),
            ..Default::default()
        },
    ))
    .insert(txn)
    .await?;

    Ok(Some(successor))
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone, Utc};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{Completion, NewTask, TaskDao, TaskFilter, TaskVisibility};
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::task;

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn task_model(id: Uuid, household_id: Option<Uuid>, user_id: Option<Uuid>) -> task::Model {
        task::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            title: "Water plants".to_string(),
            description: None,
            is_completed: false,
            completed_at: None,
            due_date: ts(),
            estimated_minutes: Some(10),
            actual_minutes: None,
            priority: "medium".to_string(),
            user_id,
            category_id: Uuid::new_v4(),
            household_id,
            assigned_to_id: None,
            parent_task_id: None,
        }
    }

    #[test]
    fn visibility_covers_household_and_personal_tasks() {
        let user_id = Uuid::new_v4();
        let household_id = Uuid::new_v4();
        let visibility = TaskVisibility {
            user_id,
            household_ids: vec![household_id],
        };

        assert!(visibility.allows(&task_model(Uuid::new_v4(), Some(household_id), None)));
        assert!(visibility.allows(&task_model(Uuid::new_v4(), None, Some(user_id))));
        assert!(!visibility.allows(&task_model(
            Uuid::new_v4(),
            None,
            Some(Uuid::new_v4())
        )));
        assert!(!visibility.allows(&task_model(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            Some(user_id)
        )));
    }

    #[test]
    fn filter_builds_one_column_filter_per_criterion() {
        let filter = TaskFilter {
            household_id: Some(Uuid::new_v4()),
            completed: Some(false),
            due_before: Some(ts()),
            due_after: Some(ts()),
            top_level_only: true,
            ..Default::default()
        };
        assert_eq!(filter.column_filters().len(), 5);

        let by_parent = TaskFilter {
            parent_task_id: Some(Uuid::new_v4()),
            top_level_only: true,
            ..Default::default()
        };
        assert_eq!(by_parent.column_filters().len(), 1);
    }

    #[tokio::test]
    async fn completing_a_completed_task_is_a_conflict() {
        let id = Uuid::new_v4();
        let mut done = task_model(id, None, Some(Uuid::new_v4()));
        done.is_completed = true;
        done.completed_at = Some(ts());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[done]])
            .into_connection();
        let dao = TaskDao::new(&db);

        let err = dao
            .complete(
                &id,
                Completion {
                    completed_by: Uuid::new_v4(),
                    at: Utc::now().fixed_offset(),
                    actual_minutes: None,
                    notes: None,
                },
            )
            .await
            .expect_err("second completion should fail");
        assert!(matches!(err, DaoLayerError::Conflict { id: got, .. } if got == id));
    }

    #[tokio::test]
    async fn reopening_an_open_task_is_a_conflict() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[task_model(id, None, Some(Uuid::new_v4()))]])
            .into_connection();
        let dao = TaskDao::new(&db);

        let err = dao.reopen(&id, None).await.expect_err("reopen should fail");
        assert!(matches!(
            err,
            DaoLayerError::Conflict {
                reason: "is not completed",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn ancestor_ids_walk_to_the_root() {
        let root = Uuid::new_v4();
        let middle = Uuid::new_v4();
        let mut middle_task = task_model(middle, None, None);
        middle_task.parent_task_id = Some(root);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[middle_task], [task_model(root, None, None)]])
            .into_connection();
        let dao = TaskDao::new(&db);

        let chain = dao
            .ancestor_ids(&middle, 10)
            .await
            .expect("walk should succeed");
        assert_eq!(chain, vec![middle, root]);
    }

    #[tokio::test]
    async fn losing_the_completion_race_is_a_conflict() {
        let id = Uuid::new_v4();
        // Read sees the task open, but another caller flips the flag first.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[task_model(id, None, Some(Uuid::new_v4()))]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let dao = TaskDao::new(&db);

        let err = dao
            .complete(
                &id,
                Completion {
                    completed_by: Uuid::new_v4(),
                    at: Utc::now().fixed_offset(),
                    actual_minutes: Some(5),
                    notes: None,
                },
            )
            .await
            .expect_err("the loser must not complete or spawn");
        assert!(matches!(
            err,
            DaoLayerError::Conflict {
                reason: "is already completed",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn losing_the_reopen_race_is_a_conflict() {
        let id = Uuid::new_v4();
        let mut done = task_model(id, None, Some(Uuid::new_v4()));
        done.is_completed = true;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[done]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let dao = TaskDao::new(&db);

        let err = dao.reopen(&id, None).await.expect_err("reopen should fail");
        assert!(matches!(
            err,
            DaoLayerError::Conflict {
                reason: "is not completed",
                ..
            }
        ));
    }

    #[test]
    fn successor_keeps_a_valid_priority() {
        let mut task = task_model(Uuid::new_v4(), None, None);
        task.priority = "urgent".to_string();
        let next = NewTask::successor_of(&task, ts()).expect("priority is valid");
        assert_eq!(next.priority.as_str(), "urgent");
    }

    #[test]
    fn successor_of_a_corrupt_priority_is_a_db_error() {
        let mut task = task_model(Uuid::new_v4(), None, None);
        task.priority = "whenever".to_string();
        let err = NewTask::successor_of(&task, ts()).expect_err("priority is invalid");
        assert!(matches!(
            err,
            DaoLayerError::Db(DbErr::Custom(ref message)) if message.contains("stored priority")
        ));
    }

    #[tokio::test]
    async fn subtree_height_counts_every_level() {
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();
        let grandchild = Uuid::new_v4();
        let mut child_task = task_model(child, None, None);
        child_task.parent_task_id = Some(root);
        let mut grandchild_task = task_model(grandchild, None, None);
        grandchild_task.parent_task_id = Some(child);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![child_task], vec![grandchild_task], vec![]])
            .into_connection();
        let dao = TaskDao::new(&db);

        let height = dao
            .subtree_height(&root)
            .await
            .expect("walk should succeed");
        assert_eq!(height, 3);
    }
}
