use async_trait::async_trait;
use capsule_types::TimeCapsule;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Storage for capsules. Adapters hold no business rules; the use cases
/// are the only writers.
#[async_trait]
pub trait TimeCapsuleRepository: Send + Sync {
    /// Insert or update the capsule keyed by its id.
    async fn save(&self, capsule: &TimeCapsule) -> anyhow::Result<()>;

    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<TimeCapsule>>;

    /// Capsules with `start <= scheduled_date <= end`, earliest first.
    async fn get_between_dates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<TimeCapsule>>;
}
