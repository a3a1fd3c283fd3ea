use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Delivery state of a capsule.
///
/// `Pending` is the only state a capsule is created in. `Sent` and `Failed`
/// are terminal: nothing moves a capsule out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapsuleStatus {
    Pending,
    Sent,
    Failed,
}

impl CapsuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

impl fmt::Display for CapsuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown capsule status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for CapsuleStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A message scheduled for future email delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeCapsule {
    pub id: Uuid,
    pub message: String,
    pub sender_name: String,
    pub recipient_email: String,
    pub scheduled_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: CapsuleStatus,
}

impl TimeCapsule {
    /// Subject line of the delivery email.
    pub fn subject(&self) -> String {
        format!("{} sent you a time capsule!", self.sender_name)
    }

    pub fn to_email(&self) -> EmailMessage {
        EmailMessage {
            to: self.recipient_email.clone(),
            subject: self.subject(),
            body: self.message.clone(),
        }
    }
}

/// Caller-supplied fields of a new capsule. Id, creation time and status
/// are assigned by the create use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTimeCapsuleInput {
    pub message: String,
    pub sender_name: String,
    pub recipient_email: String,
    pub scheduled_date: DateTime<Utc>,
}

/// Outbound plain-text email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}
