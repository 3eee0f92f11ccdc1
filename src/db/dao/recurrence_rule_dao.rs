use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{prelude::RecurrenceRule, recurrence_rule};
use crate::recurrence::RecurrencePattern;

#[derive(Clone)]
pub struct RecurrenceRuleDao {
    db: DatabaseConnection,
}

impl DaoBase for RecurrenceRuleDao {
    type Entity = RecurrenceRule;
    const ENTITY_NAME: &'static str = "recurrence rule";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Column values for `pattern`, without id or timestamps.
pub fn rule_values(task_id: Uuid, pattern: &RecurrencePattern) -> recurrence_rule::ActiveModel {
    recurrence_rule::ActiveModel {
        task_id: Set(task_id),
        frequency: Set(pattern.frequency().as_str().to_string()),
        interval: Set(i32::try_from(pattern.interval()).unwrap_or(i32::MAX)),
        days_of_week: Set(pattern.day_codes()),
        day_of_month: Set(pattern.day_of_month().and_then(|day| i32::try_from(day).ok())),
        end_date: Set(pattern.end_date()),
        occurrences: Set(pattern
            .occurrences()
            .map(|count| i32::try_from(count).unwrap_or(i32::MAX))),
        ..Default::default()
    }
}

impl RecurrenceRuleDao {
    pub async fn find_by_task(&self, task_id: &Uuid) -> DaoResult<Option<recurrence_rule::Model>> {
        let task_id = *task_id;
        self.find_first(move |query| query.filter(recurrence_rule::Column::TaskId.eq(task_id)))
            .await
    }

    /// Replaces the task's rule, keeping the row id when one exists.
    pub async fn upsert_for_task(
        &self,
        task_id: &Uuid,
        pattern: &RecurrencePattern,
    ) -> DaoResult<recurrence_rule::Model> {
        let values = rule_values(*task_id, pattern);
        match self.find_by_task(task_id).await? {
            Some(existing) => {
                self.update(existing.id, move |active| {
                    active.frequency = values.frequency;
                    active.interval = values.interval;
                    active.days_of_week = values.days_of_week;
                    active.day_of_month = values.day_of_month;
                    active.end_date = values.end_date;
                    active.occurrences = values.occurrences;
                })
                .await
            }
            None => self.create(values).await,
        }
    }

    pub async fn delete_by_task(&self, task_id: &Uuid) -> DaoResult<bool> {
        let result = RecurrenceRule::delete_many()
            .filter(recurrence_rule::Column::TaskId.eq(*task_id))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{ActiveValue, DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{RecurrenceRuleDao, rule_values};
    use crate::db::dao::DaoBase;
    use crate::db::entities::recurrence_rule;
    use crate::recurrence::{Frequency, RecurrencePattern};

    fn rule(task_id: Uuid) -> recurrence_rule::Model {
        let now = FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid");
        recurrence_rule::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            task_id,
            frequency: "weekly".to_string(),
            interval: 1,
            days_of_week: "mon,thu".to_string(),
            day_of_month: None,
            end_date: None,
            occurrences: None,
        }
    }

    #[test]
    fn rule_values_store_days_as_codes() {
        let pattern =
            RecurrencePattern::new(Frequency::Weekly, 2, &["thu", "mon"], None, None, Some(4))
                .expect("pattern should validate");
        let values = rule_values(Uuid::nil(), &pattern);

        assert_eq!(values.days_of_week, ActiveValue::Set("mon,thu".to_string()));
        assert_eq!(values.interval, ActiveValue::Set(2));
        assert_eq!(values.occurrences, ActiveValue::Set(Some(4)));
    }

    #[tokio::test]
    async fn find_by_task_returns_rule() {
        let task_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[rule(task_id)]])
            .into_connection();
        let dao = RecurrenceRuleDao::new(&db);

        let found = dao
            .find_by_task(&task_id)
            .await
            .expect("query should succeed")
            .expect("rule should exist");
        assert_eq!(found.day_codes(), vec!["mon", "thu"]);
    }

    #[tokio::test]
    async fn delete_by_task_reports_whether_a_row_went() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let dao = RecurrenceRuleDao::new(&db);

        let deleted = dao
            .delete_by_task(&Uuid::new_v4())
            .await
            .expect("delete should succeed");
        assert!(!deleted);
    }
}
