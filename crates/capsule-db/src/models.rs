//! Row types for the `time_capsules` table. Timestamps are stored as
//! fixed-width RFC 3339 UTC strings so lexical order is time order.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use capsule_types::{CapsuleStatus, TimeCapsule};

pub struct TimeCapsuleRow {
    pub id: String,
    pub message: String,
    pub sender_name: String,
    pub recipient_email: String,
    pub scheduled_date: String,
    pub created_at: String,
    pub status: String,
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("corrupt timestamp '{}'", raw))?;
    Ok(ts.with_timezone(&Utc))
}

impl From<&TimeCapsule> for TimeCapsuleRow {
    fn from(capsule: &TimeCapsule) -> Self {
        Self {
            id: capsule.id.to_string(),
            message: capsule.message.clone(),
            sender_name: capsule.sender_name.clone(),
            recipient_email: capsule.recipient_email.clone(),
            scheduled_date: format_timestamp(&capsule.scheduled_date),
            created_at: format_timestamp(&capsule.created_at),
            status: capsule.status.as_str().to_string(),
        }
    }
}

impl TryFrom<TimeCapsuleRow> for TimeCapsule {
    type Error = anyhow::Error;

    fn try_from(row: TimeCapsuleRow) -> Result<Self> {
        Ok(Self {
            id: row
                .id
                .parse()
                .with_context(|| format!("corrupt capsule id '{}'", row.id))?,
            scheduled_date: parse_timestamp(&row.scheduled_date)?,
            created_at: parse_timestamp(&row.created_at)?,
            status: row.status.parse::<CapsuleStatus>()?,
            message: row.message,
            sender_name: row.sender_name,
            recipient_email: row.recipient_email,
        })
    }
}
