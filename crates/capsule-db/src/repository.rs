use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use capsule_core::TimeCapsuleRepository;
use capsule_types::TimeCapsule;

use crate::Database;
use crate::models::{TimeCapsuleRow, format_timestamp};

/// SQLite-backed capsule storage. Queries run on the blocking pool.
#[derive(Clone)]
pub struct SqliteTimeCapsuleRepository {
    db: Arc<Database>,
}

impl SqliteTimeCapsuleRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TimeCapsuleRepository for SqliteTimeCapsuleRepository {
    async fn save(&self, capsule: &TimeCapsule) -> Result<()> {
        let db = self.db.clone();
        let row = TimeCapsuleRow::from(capsule);
        tokio::task::spawn_blocking(move || db.upsert_capsule(&row)).await?
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<TimeCapsule>> {
        let db = self.db.clone();
        let row = tokio::task::spawn_blocking(move || db.get_capsule(&id.to_string())).await??;
        row.map(TimeCapsule::try_from).transpose()
    }

    async fn get_between_dates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeCapsule>> {
        let db = self.db.clone();
        let (start, end) = (format_timestamp(&start), format_timestamp(&end));
        let rows =
            tokio::task::spawn_blocking(move || db.get_capsules_scheduled_between(&start, &end))
                .await??;
        rows.into_iter().map(TimeCapsule::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_core::testing::TimeCapsuleBuilder;
    use capsule_types::CapsuleStatus;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2023-04-15T10:30:00Z".parse().unwrap()
    }

    fn repository() -> SqliteTimeCapsuleRepository {
        SqliteTimeCapsuleRepository::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn save_then_get_by_id_round_trips() {
        let repo = repository();
        let capsule = TimeCapsuleBuilder::new(now())
            .message("multi\nline ✉️")
            .created_at(now() + Duration::nanoseconds(123_456_789))
            .build();

        repo.save(&capsule).await.unwrap();

        assert_eq!(repo.get_by_id(capsule.id).await.unwrap(), Some(capsule));
    }

    #[tokio::test]
    async fn get_by_id_missing_is_none() {
        let repo = repository();
        assert_eq!(repo.get_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn between_dates_is_inclusive_and_ordered() {
        let repo = repository();
        let start = now() - Duration::minutes(10);
        let make = |at: DateTime<Utc>| TimeCapsuleBuilder::new(now() - Duration::hours(1)).scheduled_date(at).build();

        let before = make(start - Duration::milliseconds(1));
        let at_start = make(start);
        let middle = make(now() - Duration::minutes(3));
        let at_end = make(now());
        let after = make(now() + Duration::milliseconds(1));

        for capsule in [&middle, &after, &at_end, &before, &at_start] {
            repo.save(capsule).await.unwrap();
        }

        let found = repo.get_between_dates(start, now()).await.unwrap();
        let ids: Vec<Uuid> = found.iter().map(|c| c.id).collect();

        assert_eq!(ids, vec![at_start.id, middle.id, at_end.id]);
    }

    #[tokio::test]
    async fn save_updates_status_of_pending_capsule() {
        let repo = repository();
        let mut capsule = TimeCapsuleBuilder::new(now()).build();
        repo.save(&capsule).await.unwrap();

        capsule.status = CapsuleStatus::Sent;
        repo.save(&capsule).await.unwrap();

        let stored = repo.get_by_id(capsule.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CapsuleStatus::Sent);
    }

    #[tokio::test]
    async fn terminal_status_is_never_overwritten() {
        let repo = repository();
        let mut capsule = TimeCapsuleBuilder::new(now())
            .status(CapsuleStatus::Sent)
            .build();
        repo.save(&capsule).await.unwrap();

        capsule.status = CapsuleStatus::Failed;
        repo.save(&capsule).await.unwrap();
        capsule.status = CapsuleStatus::Pending;
        repo.save(&capsule).await.unwrap();

        let stored = repo.get_by_id(capsule.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CapsuleStatus::Sent);
    }

    #[tokio::test]
    async fn only_status_is_updated_on_conflict() {
        let repo = repository();
        let original = TimeCapsuleBuilder::new(now()).message("original").build();
        repo.save(&original).await.unwrap();

        let mut changed = original.clone();
        changed.message = "rewritten".into();
        changed.status = CapsuleStatus::Failed;
        repo.save(&changed).await.unwrap();

        let stored = repo.get_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(stored.message, "original");
        assert_eq!(stored.status, CapsuleStatus::Failed);
    }

    #[tokio::test]
    async fn reopening_a_file_database_keeps_capsules() {
        let path = std::env::temp_dir().join(format!("timecapsule_test_{}.db", Uuid::new_v4()));
        let capsule = TimeCapsuleBuilder::new(now()).build();

        {
            let repo = SqliteTimeCapsuleRepository::new(Arc::new(Database::open(&path).unwrap()));
            repo.save(&capsule).await.unwrap();
        }

        let repo = SqliteTimeCapsuleRepository::new(Arc::new(Database::open(&path).unwrap()));
        assert_eq!(repo.get_by_id(capsule.id).await.unwrap(), Some(capsule));

        drop(repo);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
