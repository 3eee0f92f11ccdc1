use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{household_member, prelude::HouseholdMember};
use crate::domain::MemberRole;

#[derive(Clone)]
pub struct MemberDao {
    db: DatabaseConnection,
}

impl DaoBase for MemberDao {
    type Entity = HouseholdMember;
    const ENTITY_NAME: &'static str = "household member";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl MemberDao {
    pub async fn add_member(
        &self,
        household_id: &Uuid,
        user_id: &Uuid,
        role: MemberRole,
    ) -> DaoResult<household_member::Model> {
        let model = household_member::ActiveModel {
            household_id: Set(*household_id),
            user_id: Set(*user_id),
            role: Set(role.as_str().to_string()),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn find_membership(
        &self,
        household_id: &Uuid,
        user_id: &Uuid,
    ) -> DaoResult<Option<household_member::Model>> {
        let (household_id, user_id) = (*household_id, *user_id);
        self.find_first(move |query| {
            query
                .filter(household_member::Column::HouseholdId.eq(household_id))
                .filter(household_member::Column::UserId.eq(user_id))
        })
        .await
    }

    /// Oldest membership first.
    pub async fn list_members(&self, household_id: &Uuid) -> DaoResult<Vec<household_member::Model>> {
        let household_id = *household_id;
        self.find_iter(
            None,
            Some((household_member::Column::JoinedAt, Order::Asc)),
            move |query| query.filter(household_member::Column::HouseholdId.eq(household_id)),
        )
        .collect_all()
        .await
    }

    pub async fn household_ids_for_user(&self, user_id: &Uuid) -> DaoResult<Vec<Uuid>> {
        let user_id = *user_id;
        let memberships = self
            .find_iter(None, None, move |query| {
                query.filter(household_member::Column::UserId.eq(user_id))
            })
            .collect_all()
            .await?;
        Ok(memberships
            .into_iter()
            .map(|membership| membership.household_id)
            .collect())
    }

    pub async fn set_role(
        &self,
        membership_id: &Uuid,
        role: MemberRole,
    ) -> DaoResult<household_member::Model> {
        self.update(*membership_id, move |active| {
            active.role = Set(role.as_str().to_string());
        })
        .await
    }

    pub async fn count_with_role(&self, household_id: &Uuid, role: MemberRole) -> DaoResult<u64> {
        HouseholdMember::find()
            .filter(household_member::Column::HouseholdId.eq(*household_id))
            .filter(household_member::Column::Role.eq(role.as_str()))
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }
}
