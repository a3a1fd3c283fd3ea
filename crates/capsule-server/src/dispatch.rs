use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use capsule_core::{CapsuleError, DispatchReport, SendEmail};

/// Background task that delivers due capsules.
///
/// Ticks every `interval_secs` and runs one `SendEmail` pass per tick.
/// Ticks are sequential: a slow pass delays the next one instead of
/// overlapping it.
pub async fn run_dispatch_loop(send_email: Arc<SendEmail>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        dispatch_once(&send_email).await;
    }
}

pub async fn dispatch_once(send_email: &SendEmail) -> Option<DispatchReport> {
    match send_email.execute().await {
        Ok(report) => {
            if report.due > 0 {
                info!(
                    "Dispatch: {} due, {} sent, {} failed",
                    report.due, report.sent, report.failed
                );
            }
            if report.unsaved > 0 {
                warn!("Dispatch: {} delivery outcomes could not be recorded", report.unsaved);
            }
            Some(report)
        }
        Err(CapsuleError::DispatchInProgress) => {
            warn!("Dispatch: previous run still in progress, skipping tick");
            None
        }
        Err(e) => {
            warn!("Dispatch error: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_core::testing::{
        FixedClock, InMemoryTimeCapsuleRepository, RecordingEmailService, TimeCapsuleBuilder,
    };
    use chrono::{DateTime, Duration as ChronoDuration, Utc};

    fn now() -> DateTime<Utc> {
        "2023-04-15T10:30:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn dispatch_once_reports_deliveries() {
        let repo = Arc::new(InMemoryTimeCapsuleRepository::new());
        let email = Arc::new(RecordingEmailService::new());
        let send_email = SendEmail::new(repo.clone(), email.clone(), Arc::new(FixedClock::new(now())));
        repo.insert_all(vec![
            TimeCapsuleBuilder::new(now() - ChronoDuration::minutes(5))
                .scheduled_date(now() - ChronoDuration::minutes(1))
                .build(),
        ]);

        let report = dispatch_once(&send_email).await.unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(email.sent().len(), 1);
    }

    #[tokio::test]
    async fn dispatch_once_swallows_read_errors() {
        let repo = Arc::new(InMemoryTimeCapsuleRepository::new());
        repo.fail_reads(true);
        let send_email = SendEmail::new(
            repo,
            Arc::new(RecordingEmailService::new()),
            Arc::new(FixedClock::new(now())),
        );

        assert_eq!(dispatch_once(&send_email).await, None);
    }
}
