use sea_orm::DatabaseConnection;

use crate::{
    auth::jwt::JwtKeys,
    config::TasksConfig,
    db::dao::DaoContext,
    services::{
        auth_service::AuthService, category_service::CategoryService,
        history_service::HistoryService, household_service::HouseholdService,
        membership::Membership, recurrence_service::RecurrenceService, task_service::TaskService,
        user_service::UserService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    tasks_config: TasksConfig,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, tasks_config: TasksConfig) -> Self {
        Self {
            daos: DaoContext::new(db),
            tasks_config,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db, state.config.tasks.clone())
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user())
    }

    pub fn auth<'a>(&self, jwt: &'a JwtKeys, access_ttl_secs: usize) -> AuthService<'a> {
        AuthService::new(self.user(), jwt, access_ttl_secs)
    }

    pub fn household(&self) -> HouseholdService {
        HouseholdService::new(self.daos.household(), self.daos.member(), self.daos.user())
    }

    pub fn category(&self) -> CategoryService {
        CategoryService::new(self.daos.category(), self.daos.task(), self.membership())
    }

    pub fn task(&self) -> TaskService {
        TaskService::new(
            self.daos.task(),
            self.daos.recurrence_rule(),
            self.category(),
            self.membership(),
            self.tasks_config.clone(),
        )
    }

    pub fn recurrence(&self) -> RecurrenceService {
        RecurrenceService::new(
            self.task(),
            self.daos.recurrence_rule(),
            self.tasks_config.clone(),
        )
    }

    pub fn history(&self) -> HistoryService {
        HistoryService::new(self.task(), self.daos.task_history())
    }

    fn membership(&self) -> Membership {
        Membership::new(self.daos.household(), self.daos.member())
    }
}
