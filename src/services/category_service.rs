use uuid::Uuid;

use crate::{
    db::dao::{CategoryChanges, CategoryDao, CategoryScope, DaoBase, TaskDao},
    db::entities::category,
    domain::MemberRole,
    error::AppError,
    services::{
        crud_service::{CrudErrors, CrudService},
        membership::Membership,
    },
};

#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub name: String,
    pub emoji: Option<String>,
    pub color: Option<String>,
    pub household_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct CategoryService {
    categories: CategoryDao,
    tasks: TaskDao,
    membership: Membership,
}

impl CategoryService {
    pub fn new(categories: CategoryDao, tasks: TaskDao, membership: Membership) -> Self {
        Self {
            categories,
            tasks,
            membership,
        }
    }

    pub async fn create(
        &self,
        caller: &Uuid,
        input: CategoryInput,
    ) -> Result<category::Model, AppError> {
        let scope = match input.household_id {
            Some(household_id) => {
                self.membership
                    .require_role(&household_id, caller, MemberRole::Admin)
                    .await?;
                CategoryScope::Household(household_id)
            }
            None => CategoryScope::Personal(*caller),
        };
        let name = category_name(&input.name)?;
        self.ensure_name_free(&name, scope, None).await?;

        let category = self
            .categories
            .create_category(&name, input.emoji, input.color, scope)
            .await?;
        tracing::info!(category_id = %category.id, ?scope, "created category");
        Ok(category)
    }

    /// Everything the caller can file tasks under, or one household's set.
    pub async fn list(
        &self,
        caller: &Uuid,
        household_id: Option<Uuid>,
    ) -> Result<Vec<category::Model>, AppError> {
        match household_id {
            Some(household_id) => {
                self.membership.role_of(&household_id, caller).await?;
                Ok(self.categories.list_for_household(&household_id).await?)
            }
            None => {
                let household_ids = self.membership.household_ids(caller).await?;
                Ok(self.categories.list_visible(caller, household_ids).await?)
            }
        }
    }

    /// A category the caller may read and file tasks under.
    pub async fn require_usable(
        &self,
        caller: &Uuid,
        id: &Uuid,
    ) -> Result<category::Model, AppError> {
        let category = CrudService::find_by_id(self, *id).await?;
        match CategoryScope::of(&category) {
            CategoryScope::Household(household_id) => {
                self.membership.role_of(&household_id, caller).await?;
            }
            CategoryScope::Personal(owner) if owner != *caller => {
                return Err(AppError::not_found("Category not found"));
            }
            CategoryScope::Personal(_) | CategoryScope::Unscoped => {}
        }
        Ok(category)
    }

    pub async fn update(
        &self,
        caller: &Uuid,
        id: &Uuid,
        mut changes: CategoryChanges,
    ) -> Result<category::Model, AppError> {
        let category = self.require_manageable(caller, id).await?;
        if let Some(name) = changes.name.as_deref() {
            let name = category_name(name)?;
            self.ensure_name_free(&name, CategoryScope::of(&category), Some(category.id))
                .await?;
            changes.name = Some(name);
        }
        Ok(self.categories.update_category(id, changes).await?)
    }

    pub async fn delete(&self, caller: &Uuid, id: &Uuid) -> Result<(), AppError> {
        self.require_manageable(caller, id).await?;
        let in_use = self.tasks.count_for_category(id).await?;
        if in_use > 0 {
            return Err(AppError::conflict(format!(
                "Category is used by {in_use} task(s)"
            )));
        }
        CrudService::delete(self, *id).await
    }

    async fn require_manageable(
        &self,
        caller: &Uuid,
        id: &Uuid,
    ) -> Result<category::Model, AppError> {
        let category = self.require_usable(caller, id).await?;
        match CategoryScope::of(&category) {
            CategoryScope::Household(household_id) => {
                self.membership
                    .require_role(&household_id, caller, MemberRole::Admin)
                    .await?;
            }
            CategoryScope::Personal(_) => {}
            CategoryScope::Unscoped => {
                return Err(AppError::forbidden("Shared categories are read-only"));
            }
        }
        Ok(category)
    }

    async fn ensure_name_free(
        &self,
        name: &str,
        scope: CategoryScope,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        match self.categories.find_by_name_in_scope(name, scope).await? {
            Some(existing) if Some(existing.id) != except => Err(AppError::conflict(format!(
                "A category named '{name}' already exists"
            ))),
            _ => Ok(()),
        }
    }
}

impl CrudService for CategoryService {
    type Dao = CategoryDao;

    fn dao(&self) -> &Self::Dao {
        &self.categories
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Category not found",
            ..CrudErrors::default()
        }
    }
}

fn category_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Category name must not be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{CategoryInput, CategoryService};
    use crate::db::dao::{CategoryDao, CategoryScope, DaoBase, HouseholdDao, MemberDao, TaskDao};
    use crate::db::entities::category;
    use crate::error::AppError;
    use crate::services::membership::Membership;

    fn service(db: MockDatabase) -> CategoryService {
        let db = db.into_connection();
        CategoryService::new(
            CategoryDao::new(&db),
            TaskDao::new(&db),
            Membership::new(HouseholdDao::new(&db), MemberDao::new(&db)),
        )
    }

    fn personal(owner: Uuid, name: &str) -> category::Model {
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
            scope: CategoryScope::Personal(owner).storage_key(),
            emoji: None,
            color: None,
            user_id: Some(owner),
            household_id: None,
        }
    }

    #[tokio::test]
    async fn duplicate_personal_name_is_a_conflict() {
        let caller = Uuid::new_v4();
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[personal(caller, "Garden")]]),
        );

        let err = service
            .create(
                &caller,
                CategoryInput {
                    name: " Garden ".to_string(),
                    ..Default::default()
                },
            )
            .await
            .expect_err("duplicate should fail");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = service
            .create(&Uuid::new_v4(), CategoryInput::default())
            .await
            .expect_err("blank name should fail");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn someone_elses_personal_category_is_hidden() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[personal(Uuid::new_v4(), "Private")]]),
        );

        let err = service
            .require_usable(&Uuid::new_v4(), &Uuid::new_v4())
            .await
            .expect_err("other user's category should be hidden");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
