use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, Order, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{DaoBase, DaoResult, PaginatedResponse, stamp_new};
use crate::db::entities::{household, household_member, prelude::Household};
use crate::domain::MemberRole;

#[derive(Clone)]
pub struct HouseholdDao {
    db: DatabaseConnection,
}

impl DaoBase for HouseholdDao {
    type Entity = Household;
    const ENTITY_NAME: &'static str = "household";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl HouseholdDao {
    /// Creates the household and its first owner together.
    pub async fn create_with_owner(
        &self,
        name: &str,
        description: Option<String>,
        owner_id: &Uuid,
    ) -> DaoResult<household::Model> {
        let txn = self.db.begin().await?;
        let household = stamp_new(household::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description),
            ..Default::default()
        })
        .insert(&txn)
        .await?;
        stamp_new(household_member::ActiveModel {
            household_id: Set(household.id),
            user_id: Set(*owner_id),
            role: Set(MemberRole::Owner.as_str().to_string()),
            ..Default::default()
        })
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok(household)
    }

    /// `description: Some(None)` clears the column.
    pub async fn update_household(
        &self,
        id: &Uuid,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> DaoResult<household::Model> {
        self.update(*id, move |active| {
            if let Some(name) = name {
                active.name = Set(name);
            }
            if let Some(description) = description {
                active.description = Set(description);
            }
        })
        .await
    }

    pub async fn list_by_ids(
        &self,
        ids: Vec<Uuid>,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<household::Model>> {
        self.find(
            page,
            page_size,
            Some((household::Column::Name, Order::Asc)),
            move |query| query.filter(household::Column::Id.is_in(ids)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::HouseholdDao;
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::household;

    fn household_model(id: Uuid, name: &str) -> household::Model {
        let now = FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid");
        household::Model {
            id,
            created_at: now,
            updated_at: now,
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn list_by_ids_reports_next_page() {
        let rows = vec![
            household_model(Uuid::new_v4(), "Attic"),
            household_model(Uuid::new_v4(), "Beach house"),
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();
        let dao = HouseholdDao::new(&db);

        let page = dao
            .list_by_ids(vec![Uuid::new_v4(), Uuid::new_v4()], 1, 1)
            .await
            .expect("query should succeed");

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "Attic");
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn delete_missing_household_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let dao = HouseholdDao::new(&db);

        let err = dao
            .delete(Uuid::new_v4())
            .await
            .expect_err("delete should fail");
        assert!(matches!(err, DaoLayerError::NotFound { entity: "household", .. }));
    }
}
