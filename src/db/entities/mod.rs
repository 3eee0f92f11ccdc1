#[allow(unused_imports)]
pub mod prelude {
    pub use super::category::Entity as Category;
    pub use super::household::Entity as Household;
    pub use super::household_member::Entity as HouseholdMember;
    pub use super::recurrence_rule::Entity as RecurrenceRule;
    pub use super::task::Entity as Task;
    pub use super::task_history::Entity as TaskHistory;
    pub use super::user::Entity as User;
}

pub mod category;
pub mod household;
pub mod household_member;
pub mod recurrence_rule;
pub mod task;
pub mod task_history;
pub mod user;
