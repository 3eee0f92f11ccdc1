use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::entities::user,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::ServiceContext,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/me", get(me).patch(update_me))
        .with_state(state)
}

async fn me(State(state): State<Arc<AppState>>, claims: AuthGuard) -> ApiResult<ProfileResponse> {
    let user_id = claims.user_id()?;
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .require(&user_id)
        .await?;
    JsonApiResponse::ok(user.into())
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<ProfileResponse> {
    let user_id = claims.user_id()?;
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .rename(&user_id, body.name)
        .await?;
    JsonApiResponse::ok(user.into())
}

impl From<user::Model> for ProfileResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            created_at: model.created_at,
        }
    }
}
