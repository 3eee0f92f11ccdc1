use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, HouseholdDao, MemberDao, PaginatedResponse, UserDao},
    db::entities::{household, household_member},
    domain::MemberRole,
    error::AppError,
    services::{
        crud_service::{CrudErrors, CrudService},
        membership::Membership,
        user_service::normalize_email,
    },
};

#[derive(Debug, Clone)]
pub enum MemberTarget {
    UserId(Uuid),
    Email(String),
}

#[derive(Debug, Clone)]
pub struct MemberDetail {
    pub membership: household_member::Model,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct HouseholdService {
    households: HouseholdDao,
    members: MemberDao,
    users: UserDao,
    membership: Membership,
}

impl HouseholdService {
    pub fn new(households: HouseholdDao, members: MemberDao, users: UserDao) -> Self {
        let membership = Membership::new(households.clone(), members.clone());
        Self {
            households,
            members,
            users,
            membership,
        }
    }

    pub async fn create(
        &self,
        caller: &Uuid,
        name: &str,
        description: Option<String>,
    ) -> Result<household::Model, AppError> {
        let name = required_name(name)?;
        let household = self
            .households
            .create_with_owner(&name, description, caller)
            .await?;
        tracing::info!(household_id = %household.id, owner_id = %caller, "created household");
        Ok(household)
    }

    pub async fn list_for(
        &self,
        caller: &Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<household::Model>, AppError> {
        let ids = self.membership.household_ids(caller).await?;
        Ok(self.households.list_by_ids(ids, page, page_size).await?)
    }

    pub async fn get(&self, caller: &Uuid, id: &Uuid) -> Result<household::Model, AppError> {
        self.membership.role_of(id, caller).await?;
        CrudService::find_by_id(self, *id).await
    }

    pub async fn update(
        &self,
        caller: &Uuid,
        id: &Uuid,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> Result<household::Model, AppError> {
        self.membership
            .require_role(id, caller, MemberRole::Admin)
            .await?;
        let name = name.as_deref().map(required_name).transpose()?;
        Ok(self.households.update_household(id, name, description).await?)
    }

    pub async fn delete(&self, caller: &Uuid, id: &Uuid) -> Result<(), AppError> {
        self.membership
            .require_role(id, caller, MemberRole::Owner)
            .await?;
        CrudService::delete(self, *id).await?;
        tracing::info!(household_id = %id, "deleted household");
        Ok(())
    }

    pub async fn list_members(
        &self,
        caller: &Uuid,
        id: &Uuid,
    ) -> Result<Vec<MemberDetail>, AppError> {
        self.membership.role_of(id, caller).await?;
        let memberships = self.members.list_members(id).await?;
        let mut details = Vec::with_capacity(memberships.len());
        for membership in memberships {
            details.push(self.detail(membership).await?);
        }
        Ok(details)
    }

    pub async fn add_member(
        &self,
        caller: &Uuid,
        id: &Uuid,
        target: MemberTarget,
        role: MemberRole,
    ) -> Result<MemberDetail, AppError> {
        let caller_role = self
            .membership
            .require_role(id, caller, MemberRole::Admin)
            .await?;
        if role == MemberRole::Owner && caller_role != MemberRole::Owner {
            return Err(AppError::forbidden("Only an owner can add another owner"));
        }

        let user = match target {
            MemberTarget::UserId(user_id) => self.users.find_optional_by_id(user_id).await?,
            MemberTarget::Email(email) => {
                self.users.find_by_email(&normalize_email(&email)?).await?
            }
        }
        .ok_or_else(|| AppError::not_found("User not found"))?;

        if self.members.find_membership(id, &user.id).await?.is_some() {
            return Err(AppError::conflict("User is already a member of this household"));
        }

        let membership = self.members.add_member(id, &user.id, role).await?;
        tracing::info!(
            household_id = %id,
            user_id = %user.id,
            role = role.as_str(),
            "added household member"
        );
        Ok(MemberDetail {
            membership,
            email: user.email,
            name: user.name,
        })
    }

    pub async fn change_role(
        &self,
        caller: &Uuid,
        id: &Uuid,
        user_id: &Uuid,
        role: MemberRole,
    ) -> Result<MemberDetail, AppError> {
        self.membership
            .require_role(id, caller, MemberRole::Owner)
            .await?;
        let target = self.require_member(id, user_id).await?;
        let current = MemberRole::try_from(target.role.as_str())?;
        if current == MemberRole::Owner && role != MemberRole::Owner {
            self.ensure_other_owner(id).await?;
        }

        let membership = self.members.set_role(&target.id, role).await?;
        tracing::info!(household_id = %id, user_id = %user_id, role = role.as_str(), "changed member role");
        self.detail(membership).await
    }

    /// Admins remove others; anyone may leave, except the last owner.
    pub async fn remove_member(
        &self,
        caller: &Uuid,
        id: &Uuid,
        user_id: &Uuid,
    ) -> Result<(), AppError> {
        let caller_role = self.membership.role_of(id, caller).await?;
        let target = self.require_member(id, user_id).await?;
        let target_role = MemberRole::try_from(target.role.as_str())?;

        if caller != user_id {
            if !caller_role.at_least(MemberRole::Admin) {
                return Err(AppError::forbidden("Requires the admin role in this household"));
            }
            if target_role == MemberRole::Owner && caller_role != MemberRole::Owner {
                return Err(AppError::forbidden("Only an owner can remove an owner"));
            }
        }
        if target_role == MemberRole::Owner {
            self.ensure_other_owner(id).await?;
        }

        self.members.delete(target.id).await?;
        tracing::info!(household_id = %id, user_id = %user_id, "removed household member");
        Ok(())
    }

    async fn require_member(
        &self,
        id: &Uuid,
        user_id: &Uuid,
    ) -> Result<household_member::Model, AppError> {
        self.members
            .find_membership(id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Member not found"))
    }

    async fn ensure_other_owner(&self, id: &Uuid) -> Result<(), AppError> {
        let owners = self.members.count_with_role(id, MemberRole::Owner).await?;
        if owners <= 1 {
            return Err(AppError::conflict(
                "A household must keep at least one owner",
            ));
        }
        Ok(())
    }

    async fn detail(&self, membership: household_member::Model) -> Result<MemberDetail, AppError> {
        let user = self.users.find_by_id(membership.user_id).await?;
        Ok(MemberDetail {
            membership,
            email: user.email,
            name: user.name,
        })
    }
}

impl CrudService for HouseholdService {
    type Dao = HouseholdDao;

    fn dao(&self) -> &Self::Dao {
        &self.households
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors {
            not_found: "Household not found",
            delete_failed: "Household delete failed",
            ..CrudErrors::default()
        }
    }
}

fn required_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Name must not be empty"));
    }
    Ok(name.to_string())
}
