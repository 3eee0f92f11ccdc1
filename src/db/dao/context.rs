use sea_orm::DatabaseConnection;

use super::{
    CategoryDao, DaoBase, HouseholdDao, MemberDao, RecurrenceRuleDao, TaskDao, TaskHistoryDao,
    UserDao,
};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn household(&self) -> HouseholdDao {
        DaoBase::new(&self.db)
    }

    pub fn member(&self) -> MemberDao {
        DaoBase::new(&self.db)
    }

    pub fn category(&self) -> CategoryDao {
        DaoBase::new(&self.db)
    }

    pub fn task(&self) -> TaskDao {
        DaoBase::new(&self.db)
    }

    pub fn recurrence_rule(&self) -> RecurrenceRuleDao {
        DaoBase::new(&self.db)
    }

    pub fn task_history(&self) -> TaskHistoryDao {
        DaoBase::new(&self.db)
    }
}
