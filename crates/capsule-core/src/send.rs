use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures_util::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use capsule_types::{CapsuleStatus, TimeCapsule};

use crate::clock::Clock;
use crate::email::EmailService;
use crate::error::CapsuleError;
use crate::repository::TimeCapsuleRepository;

/// How far back a run looks for due capsules. Wide enough to absorb
/// scheduler jitter and a few missed ticks.
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 10;

/// Deliveries in flight at once within a run.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Outcome counts of one dispatch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Pending capsules found in the lookback window.
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    /// Capsules whose new status could not be written back.
    pub unsaved: usize,
}

/// Delivers every pending capsule that has come due and records the result.
pub struct SendEmail {
    repository: Arc<dyn TimeCapsuleRepository>,
    email: Arc<dyn EmailService>,
    clock: Arc<dyn Clock>,
    lookback: Duration,
    concurrency: usize,
    running: Mutex<()>,
}

struct Delivery {
    status: CapsuleStatus,
    saved: bool,
}

impl SendEmail {
    pub fn new(
        repository: Arc<dyn TimeCapsuleRepository>,
        email: Arc<dyn EmailService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            email,
            clock,
            lookback: Duration::minutes(DEFAULT_LOOKBACK_MINUTES),
            concurrency: DEFAULT_CONCURRENCY,
            running: Mutex::new(()),
        }
    }

    /// Width of the window ending at now. Non-positive widths keep the default.
    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        if lookback > Duration::zero() {
            self.lookback = lookback;
        }
        self
    }

    pub fn lookback(&self) -> Duration {
        self.lookback
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run one dispatch pass.
    ///
    /// Only a failure to read the window is returned as an error. Delivery
    /// and write-back failures are logged per capsule and counted in the
    /// report; they never stop the rest of the batch.
    pub async fn execute(&self) -> Result<DispatchReport, CapsuleError> {
        let Ok(_run) = self.running.try_lock() else {
            return Err(CapsuleError::DispatchInProgress);
        };

        let now = self.clock.now();
        let window_start = now
            .checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let pending: Vec<TimeCapsule> = self
            .repository
            .get_between_dates(window_start, now)
            .await?
            .into_iter()
            .filter(|c| c.status == CapsuleStatus::Pending)
            .collect();

        let mut report = DispatchReport {
            due: pending.len(),
            ..DispatchReport::default()
        };

        if pending.is_empty() {
            debug!(%window_start, %now, "no time capsules due");
            return Ok(report);
        }

        let deliveries: Vec<Delivery> = stream::iter(pending)
            .map(|capsule| self.deliver(capsule))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for delivery in deliveries {
            match delivery.status {
                CapsuleStatus::Sent => report.sent += 1,
                CapsuleStatus::Failed => report.failed += 1,
                CapsuleStatus::Pending => {}
            }
            if !delivery.saved {
                report.unsaved += 1;
            }
        }

        info!(
            due = report.due,
            sent = report.sent,
            failed = report.failed,
            unsaved = report.unsaved,
            "dispatch run complete"
        );
        Ok(report)
    }

    async fn deliver(&self, mut capsule: TimeCapsule) -> Delivery {
        let status = match self.email.send_email(&capsule.to_email()).await {
            Ok(()) => {
                debug!(capsule_id = %capsule.id, "time capsule delivered");
                CapsuleStatus::Sent
            }
            Err(e) => {
                warn!(capsule_id = %capsule.id, error = %e, "time capsule delivery failed");
                CapsuleStatus::Failed
            }
        };

        capsule.status = status;
        let saved = match self.repository.save(&capsule).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    capsule_id = %capsule.id,
                    %status,
                    error = %e,
                    "failed to record delivery outcome"
                );
                false
            }
        };

        Delivery { status, saved }
    }
}
