pub mod auth_service;
pub mod category_service;
pub mod context;
pub mod crud_service;
pub mod history_service;
pub mod household_service;
pub mod membership;
pub mod recurrence_service;
pub mod task_service;
pub mod user_service;

pub use context::ServiceContext;
