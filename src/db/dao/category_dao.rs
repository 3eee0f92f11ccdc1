use sea_orm::{ColumnTrait, Condition, DatabaseConnection, Order, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{category, prelude::Category};

#[derive(Clone)]
pub struct CategoryDao {
    db: DatabaseConnection,
}

impl DaoBase for CategoryDao {
    type Entity = Category;
    const ENTITY_NAME: &'static str = "category";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Who a category belongs to. A household scope wins over a personal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryScope {
    Household(Uuid),
    Personal(Uuid),
    Unscoped,
}

impl CategoryScope {
    pub fn of(model: &category::Model) -> Self {
        match (model.household_id, model.user_id) {
            (Some(household_id), _) => Self::Household(household_id),
            (None, Some(user_id)) => Self::Personal(user_id),
            (None, None) => Self::Unscoped,
        }
    }

    /// Value stored in the `scope` column.
    pub fn storage_key(self) -> String {
        match self {
            Self::Household(household_id) => format!("household:{household_id}"),
            Self::Personal(user_id) => format!("user:{user_id}"),
            Self::Unscoped => "shared".to_string(),
        }
    }

    fn condition(self) -> Condition {
        match self {
            Self::Household(household_id) => {
                Condition::all().add(category::Column::HouseholdId.eq(household_id))
            }
            Self::Personal(user_id) => Condition::all()
                .add(category::Column::UserId.eq(user_id))
                .add(category::Column::HouseholdId.is_null()),
            Self::Unscoped => Condition::all()
                .add(category::Column::UserId.is_null())
                .add(category::Column::HouseholdId.is_null()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub emoji: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

impl CategoryDao {
    pub async fn create_category(
        &self,
        name: &str,
        emoji: Option<String>,
        color: Option<String>,
        scope: CategoryScope,
    ) -> DaoResult<category::Model> {
        let (user_id, household_id) = match scope {
            CategoryScope::Household(household_id) => (None, Some(household_id)),
            CategoryScope::Personal(user_id) => (Some(user_id), None),
            CategoryScope::Unscoped => (None, None),
        };
        let model = category::ActiveModel {
            name: Set(name.to_string()),
            scope: Set(scope.storage_key()),
            emoji: Set(emoji),
            color: Set(color),
            user_id: Set(user_id),
            household_id: Set(household_id),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn find_by_name_in_scope(
        &self,
        name: &str,
        scope: CategoryScope,
    ) -> DaoResult<Option<category::Model>> {
        let name = name.to_string();
        self.find_first(move |query| {
            query
                .filter(category::Column::Name.eq(name))
                .filter(scope.condition())
        })
        .await
    }

    /// Categories owned by `user_id`, by any of `household_ids`, or by nobody.
    pub async fn list_visible(
        &self,
        user_id: &Uuid,
        household_ids: Vec<Uuid>,
    ) -> DaoResult<Vec<category::Model>> {
        let visible = Condition::any()
            .add(CategoryScope::Personal(*user_id).condition())
            .add(CategoryScope::Unscoped.condition())
            .add(category::Column::HouseholdId.is_in(household_ids));
        self.find_iter(
            None,
            Some((category::Column::Name, Order::Asc)),
            move |query| query.filter(visible.clone()),
        )
        .collect_all()
        .await
    }

    pub async fn list_for_household(&self, household_id: &Uuid) -> DaoResult<Vec<category::Model>> {
        let scope = CategoryScope::Household(*household_id);
        self.find_iter(
            None,
            Some((category::Column::Name, Order::Asc)),
            move |query| query.filter(scope.condition()),
        )
        .collect_all()
        .await
    }

    pub async fn update_category(
        &self,
        id: &Uuid,
        changes: CategoryChanges,
    ) -> DaoResult<category::Model> {
        self.update(*id, move |active| {
            if let Some(name) = changes.name {
                active.name = Set(name);
            }
            if let Some(emoji) = changes.emoji {
                active.emoji = Set(emoji);
            }
            if let Some(color) = changes.color {
                active.color = Set(color);
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{CategoryDao, CategoryScope};
    use crate::db::dao::DaoBase;
    use crate::db::entities::category;

    fn category_model(
        name: &str,
        user_id: Option<Uuid>,
        household_id: Option<Uuid>,
    ) -> category::Model {
        let now = FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid");
        category::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            name: name.to_string(),
            scope: match household_id {
                Some(household_id) => CategoryScope::Household(household_id).storage_key(),
                None => user_id.map_or_else(
                    || CategoryScope::Unscoped.storage_key(),
                    |user_id| CategoryScope::Personal(user_id).storage_key(),
                ),
            },
            emoji: None,
            color: None,
            user_id,
            household_id,
        }
    }

    #[test]
    fn scope_prefers_household_over_user() {
        let (user_id, household_id) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            CategoryScope::of(&category_model("Chores", Some(user_id), Some(household_id))),
            CategoryScope::Household(household_id)
        );
        assert_eq!(
            CategoryScope::of(&category_model("Chores", Some(user_id), None)),
            CategoryScope::Personal(user_id)
        );
        assert_eq!(
            CategoryScope::of(&category_model("Chores", None, None)),
            CategoryScope::Unscoped
        );
    }

    #[tokio::test]
    async fn find_by_name_in_scope_returns_existing_row() {
        let household_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[category_model("Kitchen", None, Some(household_id))]])
            .into_connection();
        let dao = CategoryDao::new(&db);

        let found = dao
            .find_by_name_in_scope("Kitchen", CategoryScope::Household(household_id))
            .await
            .expect("query should succeed");
        assert_eq!(found.map(|c| c.name), Some("Kitchen".to_string()));
    }
}
