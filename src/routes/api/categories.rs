use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::params::nullable;
use crate::{
    db::dao::CategoryChanges,
    db::entities::category,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        category_service::{CategoryInput, CategoryService},
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub emoji: Option<String>,
    pub color: Option<String>,
    pub household_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub emoji: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    pub household_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub emoji: Option<String>,
    pub color: Option<String>,
    pub user_id: Option<Uuid>,
    pub household_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            patch(update_category).delete(delete_category),
        )
        .with_state(state)
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Json(body): Json<CreateCategoryRequest>,
) -> ApiResult<CategoryResponse> {
    let caller = claims.user_id()?;
    let category = category_service(&state)
        .create(
            &caller,
            CategoryInput {
                name: body.name,
                emoji: body.emoji,
                color: body.color,
                household_id: body.household_id,
            },
        )
        .await?;
    JsonApiResponse::created(category.into())
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Query(query): Query<ListCategoriesQuery>,
) -> ApiResult<Vec<CategoryResponse>> {
    let caller = claims.user_id()?;
    let categories = category_service(&state)
        .list(&caller, query.household_id)
        .await?;
    JsonApiResponse::ok(categories.into_iter().map(CategoryResponse::from).collect())
}

async fn update_category(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCategoryRequest>,
) -> ApiResult<CategoryResponse> {
    let caller = claims.user_id()?;
    let category = category_service(&state)
        .update(
            &caller,
            &id,
            CategoryChanges {
                name: body.name,
                emoji: body.emoji,
                color: body.color,
            },
        )
        .await?;
    JsonApiResponse::ok(category.into())
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let caller = claims.user_id()?;
    category_service(&state).delete(&caller, &id).await?;
    JsonApiResponse::deleted()
}

fn category_service(state: &AppState) -> CategoryService {
    ServiceContext::from_state(state).category()
}

impl From<category::Model> for CategoryResponse {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            emoji: model.emoji,
            color: model.color,
            user_id: model.user_id,
            household_id: model.household_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
