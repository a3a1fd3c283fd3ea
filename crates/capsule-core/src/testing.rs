//! Test doubles. Each test builds its own instances and injects them;
//! nothing here is shared between tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use capsule_types::{CapsuleStatus, CreateTimeCapsuleInput, EmailMessage, TimeCapsule};

use crate::clock::Clock;
use crate::email::EmailService;
use crate::repository::TimeCapsuleRepository;

// -- Repository --

#[derive(Default)]
pub struct InMemoryTimeCapsuleRepository {
    capsules: Mutex<HashMap<Uuid, TimeCapsule>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    fail_reads: AtomicBool,
}

impl InMemoryTimeCapsuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed capsules without counting them as saves.
    pub fn insert_all(&self, capsules: impl IntoIterator<Item = TimeCapsule>) {
        let mut map = self.capsules.lock().unwrap();
        for capsule in capsules {
            map.insert(capsule.id, capsule);
        }
    }

    pub fn get(&self, id: Uuid) -> Option<TimeCapsule> {
        self.capsules.lock().unwrap().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<TimeCapsule> {
        self.capsules.lock().unwrap().values().cloned().collect()
    }

    /// Number of `save` calls that reached storage.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TimeCapsuleRepository for InMemoryTimeCapsuleRepository {
    async fn save(&self, capsule: &TimeCapsule) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(anyhow!("storage unavailable"));
        }
        // Same guard as the SQLite upsert: a delivered or failed capsule stays put.
        let mut map = self.capsules.lock().unwrap();
        let locked = map.get(&capsule.id).is_some_and(|c| c.status.is_terminal());
        if !locked {
            map.insert(capsule.id, capsule.clone());
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<TimeCapsule>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("storage unavailable"));
        }
        Ok(self.get(id))
    }

    async fn get_between_dates(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeCapsule>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("storage unavailable"));
        }
        let mut found: Vec<TimeCapsule> = self
            .capsules
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.scheduled_date >= start && c.scheduled_date <= end)
            .cloned()
            .collect();
        found.sort_by_key(|c| c.scheduled_date);
        Ok(found)
    }
}

// -- Email --

#[derive(Default)]
pub struct RecordingEmailService {
    sent: Mutex<Vec<EmailMessage>>,
    attempts: AtomicUsize,
    fail_all: AtomicBool,
    failing_recipients: Mutex<HashSet<String>>,
}

impl RecordingEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that rejects every message.
    pub fn failing() -> Self {
        let service = Self::default();
        service.fail_all.store(true, Ordering::SeqCst);
        service
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing_recipients
            .lock()
            .unwrap()
            .insert(recipient.to_string());
    }

    /// Messages that were accepted.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Every call, accepted or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send_email(&self, email: &EmailMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst)
            || self.failing_recipients.lock().unwrap().contains(&email.to)
        {
            return Err(anyhow!("email provider rejected message to {}", email.to));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// -- Clock --

pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// -- Builders --

/// Pending capsule created at `now`, due two minutes later.
pub struct TimeCapsuleBuilder {
    capsule: TimeCapsule,
}

impl TimeCapsuleBuilder {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            capsule: TimeCapsule {
                id: Uuid::new_v4(),
                message: "Test message".into(),
                sender_name: "Test Sender".into(),
                recipient_email: "test@example.com".into(),
                scheduled_date: now + Duration::minutes(2),
                created_at: now,
                status: CapsuleStatus::Pending,
            },
        }
    }

    pub fn message(mut self, message: &str) -> Self {
        self.capsule.message = message.into();
        self
    }

    pub fn sender_name(mut self, sender_name: &str) -> Self {
        self.capsule.sender_name = sender_name.into();
        self
    }

    pub fn recipient_email(mut self, recipient_email: &str) -> Self {
        self.capsule.recipient_email = recipient_email.into();
        self
    }

    pub fn scheduled_date(mut self, scheduled_date: DateTime<Utc>) -> Self {
        self.capsule.scheduled_date = scheduled_date;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.capsule.created_at = created_at;
        self
    }

    pub fn status(mut self, status: CapsuleStatus) -> Self {
        self.capsule.status = status;
        self
    }

    pub fn build(self) -> TimeCapsule {
        self.capsule
    }
}

/// Valid create input due two minutes after `now`.
pub struct CreateTimeCapsuleInputBuilder {
    input: CreateTimeCapsuleInput,
}

impl CreateTimeCapsuleInputBuilder {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            input: CreateTimeCapsuleInput {
                message: "Test message".into(),
                sender_name: "Test Sender".into(),
                recipient_email: "test@example.com".into(),
                scheduled_date: now + Duration::minutes(2),
            },
        }
    }

    pub fn message(mut self, message: &str) -> Self {
        self.input.message = message.into();
        self
    }

    pub fn sender_name(mut self, sender_name: &str) -> Self {
        self.input.sender_name = sender_name.into();
        self
    }

    pub fn recipient_email(mut self, recipient_email: &str) -> Self {
        self.input.recipient_email = recipient_email.into();
        self
    }

    pub fn scheduled_date(mut self, scheduled_date: DateTime<Utc>) -> Self {
        self.input.scheduled_date = scheduled_date;
        self
    }

    pub fn build(self) -> CreateTimeCapsuleInput {
        self.input
    }
}
