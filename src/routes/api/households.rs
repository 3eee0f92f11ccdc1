use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::params::{nullable, page_params};
use crate::{
    db::dao::PaginatedResponse,
    db::entities::household,
    domain::MemberRole,
    error::AppError,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        household_service::{HouseholdService, MemberDetail, MemberTarget},
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateHouseholdRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHouseholdRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListHouseholdsQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct HouseholdResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub joined_at: DateTimeWithTimeZone,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/households", get(list_households).post(create_household))
        .route(
            "/households/{id}",
            get(get_household)
                .patch(update_household)
                .delete(delete_household),
        )
        .route(
            "/households/{id}/members",
            get(list_members).post(add_member),
        )
        .route(
            "/households/{id}/members/{user_id}",
            patch(change_role).delete(remove_member),
        )
        .with_state(state)
}

async fn create_household(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Json(body): Json<CreateHouseholdRequest>,
) -> ApiResult<HouseholdResponse> {
    let caller = claims.user_id()?;
    let household = household_service(&state)
        .create(&caller, &body.name, body.description)
        .await?;
    JsonApiResponse::created(household.into())
}

async fn list_households(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Query(query): Query<ListHouseholdsQuery>,
) -> ApiResult<PaginatedResponse<HouseholdResponse>> {
    let caller = claims.user_id()?;
    let (page, page_size) = page_params(query.page, query.page_size);
    let households = household_service(&state)
        .list_for(&caller, page, page_size)
        .await?;
    JsonApiResponse::ok(households.map(HouseholdResponse::from))
}

async fn get_household(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<HouseholdResponse> {
    let caller = claims.user_id()?;
    let household = household_service(&state).get(&caller, &id).await?;
    JsonApiResponse::ok(household.into())
}

async fn update_household(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateHouseholdRequest>,
) -> ApiResult<HouseholdResponse> {
    let caller = claims.user_id()?;
    let household = household_service(&state)
        .update(&caller, &id, body.name, body.description)
        .await?;
    JsonApiResponse::ok(household.into())
}

async fn delete_household(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let caller = claims.user_id()?;
    household_service(&state).delete(&caller, &id).await?;
    JsonApiResponse::deleted()
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<MemberResponse>> {
    let caller = claims.user_id()?;
    let members = household_service(&state).list_members(&caller, &id).await?;
    JsonApiResponse::ok(members.into_iter().map(MemberResponse::from).collect())
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<AddMemberRequest>,
) -> ApiResult<MemberResponse> {
    let caller = claims.user_id()?;
    let target = match (body.user_id, body.email) {
        (Some(user_id), None) => MemberTarget::UserId(user_id),
        (None, Some(email)) => MemberTarget::Email(email),
        _ => {
            return Err(AppError::bad_request(
                "Provide exactly one of user_id or email",
            ));
        }
    };
    let role = match body.role.as_deref() {
        Some(role) => MemberRole::try_from(role)?,
        None => MemberRole::Member,
    };
    let member = household_service(&state)
        .add_member(&caller, &id, target, role)
        .await?;
    JsonApiResponse::created(member.into())
}

async fn change_role(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ChangeRoleRequest>,
) -> ApiResult<MemberResponse> {
    let caller = claims.user_id()?;
    let role = MemberRole::try_from(body.role.as_str())?;
    let member = household_service(&state)
        .change_role(&caller, &id, &user_id, role)
        .await?;
    JsonApiResponse::ok(member.into())
}

async fn remove_member(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<serde_json::Value> {
    let caller = claims.user_id()?;
    household_service(&state)
        .remove_member(&caller, &id, &user_id)
        .await?;
    JsonApiResponse::deleted()
}

fn household_service(state: &AppState) -> HouseholdService {
    ServiceContext::from_state(state).household()
}

impl From<household::Model> for HouseholdResponse {
    fn from(model: household::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<MemberDetail> for MemberResponse {
    fn from(detail: MemberDetail) -> Self {
        Self {
            user_id: detail.membership.user_id,
            email: detail.email,
            name: detail.name,
            role: detail.membership.role,
            joined_at: detail.membership.joined_at,
        }
    }
}
