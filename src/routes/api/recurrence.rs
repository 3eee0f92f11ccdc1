use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::entities::recurrence_rule,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        recurrence_service::{RecurrenceInput, RecurrenceService},
    },
    state::AppState,
};

const DEFAULT_PREVIEW_COUNT: u32 = 5;

#[derive(Debug, Deserialize)]
pub struct SetRecurrenceRequest {
    pub frequency: String,
    pub interval: Option<i64>,
    #[serde(default)]
    pub days_of_week: Vec<String>,
    pub day_of_month: Option<i64>,
    pub end_date: Option<DateTime<FixedOffset>>,
    pub occurrences: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub count: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RecurrenceResponse {
    pub id: Uuid,
    pub task_id: Uuid,
    pub frequency: String,
    pub interval: i32,
    pub days_of_week: Vec<String>,
    pub day_of_month: Option<i32>,
    pub end_date: Option<DateTimeWithTimeZone>,
    pub occurrences: Option<i32>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub due_dates: Vec<DateTime<FixedOffset>>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/tasks/{id}/recurrence",
            get(get_recurrence)
                .put(set_recurrence)
                .delete(delete_recurrence),
        )
        .route("/tasks/{id}/recurrence/preview", get(preview_recurrence))
        .with_state(state)
}

async fn get_recurrence(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<RecurrenceResponse> {
    let caller = claims.user_id()?;
    let rule = recurrence_service(&state).get(&caller, &id).await?;
    JsonApiResponse::ok(rule.into())
}

async fn set_recurrence(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<SetRecurrenceRequest>,
) -> ApiResult<RecurrenceResponse> {
    let caller = claims.user_id()?;
    let input = RecurrenceInput {
        frequency: body.frequency,
        interval: body.interval,
        days_of_week: body.days_of_week,
        day_of_month: body.day_of_month,
        end_date: body.end_date,
        occurrences: body.occurrences,
    };
    let rule = recurrence_service(&state).set(&caller, &id, input).await?;
    JsonApiResponse::ok(rule.into())
}

async fn delete_recurrence(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let caller = claims.user_id()?;
    recurrence_service(&state).remove(&caller, &id).await?;
    JsonApiResponse::deleted()
}

async fn preview_recurrence(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> ApiResult<PreviewResponse> {
    let caller = claims.user_id()?;
    let count = query.count.unwrap_or(DEFAULT_PREVIEW_COUNT);
    let due_dates = recurrence_service(&state)
        .preview(&caller, &id, count)
        .await?;
    JsonApiResponse::ok(PreviewResponse { due_dates })
}

fn recurrence_service(state: &AppState) -> RecurrenceService {
    ServiceContext::from_state(state).recurrence()
}

impl From<recurrence_rule::Model> for RecurrenceResponse {
    fn from(model: recurrence_rule::Model) -> Self {
        Self {
            days_of_week: model.day_codes(),
            id: model.id,
            task_id: model.task_id,
            frequency: model.frequency,
            interval: model.interval,
            day_of_month: model.day_of_month,
            end_date: model.end_date,
            occurrences: model.occurrences,
            updated_at: model.updated_at,
        }
    }
}
