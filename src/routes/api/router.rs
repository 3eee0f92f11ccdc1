use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{auth, categories, households, protected, public, recurrence, tasks};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(public::router(state.clone()))
        .merge(auth::router(state.clone()))
        .merge(protected::router(state.clone()))
        .merge(households::router(state.clone()))
        .merge(categories::router(state.clone()))
        .merge(tasks::router(state.clone()))
        .merge(recurrence::router(state))
}
