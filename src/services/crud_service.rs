use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::db::dao::{DaoBase, DaoLayerError};
use crate::error::AppError;

type CrudEntity<D> = <D as DaoBase>::Entity;
type CrudModel<D> = <CrudEntity<D> as EntityTrait>::Model;

#[derive(Clone, Copy)]
pub struct CrudErrors {
    pub find_failed: &'static str,
    pub not_found: &'static str,
    pub delete_failed: &'static str,
}

impl Default for CrudErrors {
    fn default() -> Self {
        Self {
            find_failed: "Find failed",
            not_found: "Resource not found",
            delete_failed: "Delete failed",
        }
    }
}

#[derive(Clone, Copy)]
pub enum CrudOp {
    Find,
    Delete,
}

/// Lookup and delete for services that sit on one DAO, with errors reworded
/// per service. Writes go through the DAO's own typed methods.
#[async_trait::async_trait]
pub trait CrudService {
    type Dao: DaoBase;

    fn dao(&self) -> &Self::Dao;

    fn errors(&self) -> CrudErrors {
        CrudErrors::default()
    }

    fn map_error(&self, op: CrudOp, err: DaoLayerError) -> AppError {
        let errors = self.errors();
        match err {
            DaoLayerError::Db(db_err) => {
                let mapped = AppError::from(db_err);
                if !matches!(mapped, AppError::Internal { .. }) {
                    return mapped;
                }
                let context = match op {
                    CrudOp::Find => errors.find_failed,
                    CrudOp::Delete => errors.delete_failed,
                };
                let message = format!("{context}. Please check the logs for more details");
                match mapped {
                    AppError::Internal {
                        source: Some(source),
                        ..
                    } => AppError::Internal {
                        message,
                        source: Some(source),
                    },
                    _ => AppError::internal(message),
                }
            }
            DaoLayerError::NotFound { .. } => AppError::not_found(errors.not_found),
            DaoLayerError::Conflict { .. } | DaoLayerError::InvalidPagination { .. } => {
                AppError::from(err)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<CrudModel<Self::Dao>, AppError> {
        self.dao()
            .find_by_id(id)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.dao()
            .delete(id)
            .await
            .map(|_| ())
            .map_err(|err| self.map_error(CrudOp::Delete, err))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{CrudErrors, CrudService};
    use crate::db::dao::{DaoBase, HouseholdDao};
    use crate::db::entities::household;
    use crate::error::AppError;

    #[derive(Clone)]
    struct TestCrudService {
        dao: HouseholdDao,
    }

    impl CrudService for TestCrudService {
        type Dao = HouseholdDao;

        fn dao(&self) -> &Self::Dao {
            &self.dao
        }

        fn errors(&self) -> CrudErrors {
            CrudErrors {
                not_found: "Household not found",
                ..CrudErrors::default()
            }
        }
    }

    fn service(db: MockDatabase) -> TestCrudService {
        TestCrudService {
            dao: HouseholdDao::new(&db.into_connection()),
        }
    }

    fn model(id: Uuid, name: &str) -> household::Model {
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
    async fn find_by_id_maps_not_found_to_service_message() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<household::Model>::new()]),
        );

        let err = service
            .find_by_id(Uuid::new_v4())
            .await
            .expect_err("lookup should fail");
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.message(), "Household not found");
    }

    #[tokio::test]
    async fn delete_maps_missing_row_to_not_found() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]));

        let err = service
            .delete(Uuid::new_v4())
            .await
            .expect_err("delete should fail");
        assert_eq!(err.message(), "Household not found");
    }

    #[tokio::test]
    async fn find_by_id_returns_model_on_success() {
        let id = Uuid::new_v4();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[model(id, "Flat")]]),
        );

        let found = service.find_by_id(id).await.expect("lookup should succeed");
        assert_eq!(found.name, "Flat");
    }

    #[tokio::test]
    async fn find_by_id_maps_db_error_to_internal_with_find_message() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("select failed".to_string())]),
        );

        let err = service
            .find_by_id(Uuid::new_v4())
            .await
            .expect_err("lookup should fail");
        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(
            err.message(),
            "Find failed. Please check the logs for more details"
        );
        assert!(err.source_error().is_some());
    }
}
