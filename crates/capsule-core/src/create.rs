use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use capsule_types::{CapsuleStatus, CreateTimeCapsuleInput, TimeCapsule};

use crate::clock::Clock;
use crate::error::CapsuleError;
use crate::repository::TimeCapsuleRepository;

/// Validates and persists a new capsule.
pub struct CreateTimeCapsule {
    repository: Arc<dyn TimeCapsuleRepository>,
    clock: Arc<dyn Clock>,
    min_lead: Duration,
}

impl CreateTimeCapsule {
    /// Accepts any delivery date strictly after the current time.
    pub fn new(repository: Arc<dyn TimeCapsuleRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            min_lead: Duration::zero(),
        }
    }

    /// Require `scheduled_date > now + min_lead`. Negative leads count as zero.
    pub fn with_min_lead(mut self, min_lead: Duration) -> Self {
        self.min_lead = min_lead.max(Duration::zero());
        self
    }

    pub fn min_lead(&self) -> Duration {
        self.min_lead
    }

    pub async fn execute(&self, input: CreateTimeCapsuleInput) -> Result<TimeCapsule, CapsuleError> {
        let now = self.clock.now();
        // Past the representable range nothing can be scheduled.
        let earliest = now
            .checked_add_signed(self.min_lead)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        if input.scheduled_date <= earliest {
            return Err(CapsuleError::TooEarlyToSchedule {
                scheduled: input.scheduled_date,
                earliest,
            });
        }

        let capsule = TimeCapsule {
            id: Uuid::new_v4(),
            message: input.message,
            sender_name: input.sender_name,
            recipient_email: input.recipient_email,
            scheduled_date: input.scheduled_date,
            created_at: now,
            status: CapsuleStatus::Pending,
        };

        self.repository.save(&capsule).await?;

        info!(
            capsule_id = %capsule.id,
            scheduled_date = %capsule.scheduled_date,
            "time capsule created"
        );
        Ok(capsule)
    }
}
