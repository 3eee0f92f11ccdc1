use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, HouseholdDao, MemberDao},
    db::entities::household_member,
    domain::MemberRole,
    error::AppError,
};

/// Role lookups shared by every household-scoped service.
#[derive(Clone)]
pub struct Membership {
    households: HouseholdDao,
    members: MemberDao,
}

impl Membership {
    pub fn new(households: HouseholdDao, members: MemberDao) -> Self {
        Self {
            households,
            members,
        }
    }

    /// The caller's role in the household, or 404 / 403.
    pub async fn role_of(&self, household_id: &Uuid, user_id: &Uuid) -> Result<MemberRole, AppError> {
        let membership = self.membership_of(household_id, user_id).await?;
        MemberRole::try_from(membership.role.as_str())
    }

    pub async fn membership_of(
        &self,
        household_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<household_member::Model, AppError> {
        if self
            .households
            .find_optional_by_id(*household_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("Household not found"));
        }
        self.members
            .find_membership(household_id, user_id)
            .await?
            .ok_or_else(|| AppError::forbidden("Not a member of this household"))
    }

    pub async fn require_role(
        &self,
        household_id: &Uuid,
        user_id: &Uuid,
        required: MemberRole,
    ) -> Result<MemberRole, AppError> {
        let role = self.role_of(household_id, user_id).await?;
        if !role.at_least(required) {
            return Err(AppError::forbidden(format!(
                "Requires the {} role in this household",
                required.as_str()
            )));
        }
        Ok(role)
    }

    pub async fn household_ids(&self, user_id: &Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(self.members.household_ids_for_user(user_id).await?)
    }
}
