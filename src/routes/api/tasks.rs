use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    params::{nullable, page_params},
    recurrence::RecurrenceResponse,
};
use crate::{
    db::dao::{CompletionOutcome, PaginatedResponse, TaskChanges, TaskFilter},
    db::entities::{task, task_history},
    domain::TaskPriority,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        task_service::{TaskDetail, TaskInput, TaskService},
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<FixedOffset>,
    pub estimated_minutes: Option<i32>,
    pub priority: Option<String>,
    pub category_id: Uuid,
    pub household_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub due_date: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_minutes: Option<Option<i32>>,
    pub priority: Option<String>,
    pub category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "nullable")]
    pub assigned_to_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_task_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub household_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub completed: Option<bool>,
    pub due_before: Option<DateTime<FixedOffset>>,
    pub due_after: Option<DateTime<FixedOffset>>,
    pub parent_task_id: Option<Uuid>,
    pub top_level_only: Option<bool>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteTaskRequest {
    pub actual_minutes: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReopenTaskRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub due_date: DateTimeWithTimeZone,
    pub estimated_minutes: Option<i32>,
    pub actual_minutes: Option<i32>,
    pub priority: String,
    pub user_id: Option<Uuid>,
    pub category_id: Uuid,
    pub household_id: Option<Uuid>,
    pub assigned_to_id: Option<Uuid>,
    pub parent_task_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    #[serde(flatten)]
    pub task: TaskResponse,
    pub subtasks: Vec<TaskResponse>,
    pub recurrence: Option<RecurrenceResponse>,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub task: TaskResponse,
    pub successor: Option<TaskResponse>,
}

#[derive(Debug, Serialize)]
pub struct DeletedTasksResponse {
    pub removed: u64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub id: Uuid,
    pub task_id: Uuid,
    pub action: String,
    pub completed_by: Option<Uuid>,
    pub completion_time: Option<DateTimeWithTimeZone>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/complete", post(complete_task))
        .route("/tasks/{id}/reopen", post(reopen_task))
        .route("/tasks/{id}/history", get(task_history))
        .with_state(state)
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Json(body): Json<CreateTaskRequest>,
) -> ApiResult<TaskResponse> {
    let caller = claims.user_id()?;
    let priority = body
        .priority
        .as_deref()
        .map(TaskPriority::try_from)
        .transpose()?;
    let task = task_service(&state)
        .create(
            &caller,
            TaskInput {
                title: body.title,
                description: body.description,
                due_date: body.due_date,
                estimated_minutes: body.estimated_minutes,
                priority,
                category_id: body.category_id,
                household_id: body.household_id,
                assigned_to_id: body.assigned_to_id,
                parent_task_id: body.parent_task_id,
            },
        )
        .await?;
    JsonApiResponse::created(task.into())
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<PaginatedResponse<TaskResponse>> {
    let caller = claims.user_id()?;
    let (page, page_size) = page_params(query.page, query.page_size);
    let filter = TaskFilter {
        household_id: query.household_id,
        category_id: query.category_id,
        completed: query.completed,
        due_before: query.due_before,
        due_after: query.due_after,
        parent_task_id: query.parent_task_id,
        top_level_only: query.top_level_only.unwrap_or(false),
    };
    let tasks = task_service(&state)
        .list(&caller, filter, page, page_size)
        .await?;
    JsonApiResponse::ok(tasks.map(TaskResponse::from))
}

async fn get_task(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<TaskDetailResponse> {
    let caller = claims.user_id()?;
    let detail = task_service(&state).get(&caller, &id).await?;
    JsonApiResponse::ok(detail.into())
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTaskRequest>,
) -> ApiResult<TaskResponse> {
    let caller = claims.user_id()?;
    let priority = body
        .priority
        .as_deref()
        .map(TaskPriority::try_from)
        .transpose()?;
    let changes = TaskChanges {
        title: body.title,
        description: body.description,
        due_date: body.due_date,
        estimated_minutes: body.estimated_minutes,
        priority,
        category_id: body.category_id,
        assigned_to_id: body.assigned_to_id,
        parent_task_id: body.parent_task_id,
    };
    let task = task_service(&state).update(&caller, &id, changes).await?;
    JsonApiResponse::ok(task.into())
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedTasksResponse> {
    let caller = claims.user_id()?;
    let removed = task_service(&state).delete(&caller, &id).await?;
    JsonApiResponse::with_status(StatusCode::OK, "deleted", DeletedTasksResponse { removed })
}

async fn complete_task(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<CompleteTaskRequest>,
) -> ApiResult<CompletionResponse> {
    let caller = claims.user_id()?;
    let outcome = task_service(&state)
        .complete(&caller, &id, body.actual_minutes, body.notes)
        .await?;
    JsonApiResponse::ok(outcome.into())
}

async fn reopen_task(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<ReopenTaskRequest>,
) -> ApiResult<TaskResponse> {
    let caller = claims.user_id()?;
    let task = task_service(&state).reopen(&caller, &id, body.notes).await?;
    JsonApiResponse::ok(task.into())
}

async fn task_history(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<HistoryResponse>> {
    let caller = claims.user_id()?;
    let (page, page_size) = page_params(query.page, query.page_size);
    let history = ServiceContext::from_state(&state)
        .history()
        .list(&caller, &id, page, page_size)
        .await?;
    JsonApiResponse::ok(history.map(HistoryResponse::from))
}

fn task_service(state: &AppState) -> TaskService {
    ServiceContext::from_state(state).task()
}

impl From<task::Model> for TaskResponse {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            is_completed: model.is_completed,
            completed_at: model.completed_at,
            due_date: model.due_date,
            estimated_minutes: model.estimated_minutes,
            actual_minutes: model.actual_minutes,
            priority: model.priority,
            user_id: model.user_id,
            category_id: model.category_id,
            household_id: model.household_id,
            assigned_to_id: model.assigned_to_id,
            parent_task_id: model.parent_task_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<TaskDetail> for TaskDetailResponse {
    fn from(detail: TaskDetail) -> Self {
        Self {
            task: detail.task.into(),
            subtasks: detail.subtasks.into_iter().map(TaskResponse::from).collect(),
            recurrence: detail.recurrence.map(RecurrenceResponse::from),
        }
    }
}

impl From<CompletionOutcome> for CompletionResponse {
    fn from(outcome: CompletionOutcome) -> Self {
        Self {
            task: outcome.task.into(),
            successor: outcome.successor.map(TaskResponse::from),
        }
    }
}

impl From<task_history::Model> for HistoryResponse {
    fn from(model: task_history::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            action: model.action,
            completed_by: model.completed_by,
            completion_time: model.completion_time,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}
