pub mod base;
pub mod base_traits;
mod context;
pub mod error;
pub mod category_dao;
pub mod household_dao;
pub mod member_dao;
pub mod recurrence_rule_dao;
pub mod task_dao;
pub mod task_history_dao;
pub mod user_dao;

pub use base::{
    ColumnFilter, CompareOp, DaoBase, DaoPager, FilterOp, PaginatedResponse, stamp_new,
};
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use category_dao::{CategoryChanges, CategoryDao, CategoryScope};
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use household_dao::HouseholdDao;
pub use member_dao::MemberDao;
pub use recurrence_rule_dao::{RecurrenceRuleDao, rule_values};
pub use task_dao::{
    Completion, CompletionOutcome, NewTask, TaskChanges, TaskDao, TaskFilter, TaskVisibility,
};
pub use task_history_dao::{HistoryEntry, TaskHistoryDao};
pub use user_dao::UserDao;
