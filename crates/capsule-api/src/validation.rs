use chrono::{DateTime, Utc};
use lettre::Address;
use serde_json::{Map, Value};

use capsule_types::CreateTimeCapsuleInput;
use capsule_types::api::CreateCapsuleRequest;

use crate::error::ApiError;

/// Parses as an RFC 5322 address and additionally requires a dotted
/// domain and a local part without stray dots.
pub fn is_valid_email(address: &str) -> bool {
    let Ok(address) = address.parse::<Address>() else {
        return false;
    };
    let user = address.user();

    address.domain().contains('.')
        && !user.starts_with('.')
        && !user.ends_with('.')
        && !user.contains("..")
}

/// Turn a create request into use-case input, collecting one message per
/// invalid field.
pub fn validate_create(req: CreateCapsuleRequest) -> Result<CreateTimeCapsuleInput, ApiError> {
    let mut errors = Map::new();

    if req.message.trim().is_empty() {
        errors.insert("message".into(), Value::from("Message is required"));
    }
    if req.sender_name.trim().is_empty() {
        errors.insert("senderName".into(), Value::from("Sender name is required"));
    }
    if !is_valid_email(&req.recipient_email) {
        errors.insert("recipientEmail".into(), Value::from("Invalid email address"));
    }

    let scheduled_date = match DateTime::parse_from_rfc3339(&req.scheduled_date) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(_) => {
            errors.insert("scheduledDate".into(), Value::from("Invalid date format"));
            None
        }
    };

    match scheduled_date {
        Some(scheduled_date) if errors.is_empty() => Ok(CreateTimeCapsuleInput {
            message: req.message,
            sender_name: req.sender_name,
            recipient_email: req.recipient_email,
            scheduled_date,
        }),
        _ => Err(ApiError::InvalidPayload(Value::Object(errors))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateCapsuleRequest {
        CreateCapsuleRequest {
            message: "Hello, future".into(),
            sender_name: "Ada".into(),
            recipient_email: "grace@example.com".into(),
            scheduled_date: "2030-01-01T09:00:00+02:00".into(),
        }
    }

    #[test]
    fn accepts_common_addresses() {
        for address in [
            "test@example.com",
            "first.last+tag@mail.example.co.uk",
            "x@a-b.io",
        ] {
            assert!(is_valid_email(address), "{}", address);
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for address in [
            "",
            "plainaddress",
            "@example.com",
            "user@",
            "user@localhost",
            "user@@example.com",
            "user@exa mple.com",
            "user@-example.com",
            "user@example..com",
            ".user@example.com",
            "us..er@example.com",
            "a<b>@example.com",
            "a,b@example.com",
            "a\"b@example.com",
            "a(b)@example.com",
            "a\\b@example.com",
            "a;b@example.com",
        ] {
            assert!(!is_valid_email(address), "{}", address);
        }
    }

    #[test]
    fn valid_request_converts_date_to_utc() {
        let input = validate_create(request()).unwrap();

        assert_eq!(input.sender_name, "Ada");
        assert_eq!(
            input.scheduled_date,
            "2030-01-01T07:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn reports_every_invalid_field() {
        let req = CreateCapsuleRequest {
            message: "  ".into(),
            sender_name: String::new(),
            recipient_email: "nope".into(),
            scheduled_date: "next tuesday".into(),
        };

        match validate_create(req) {
            Err(ApiError::InvalidPayload(Value::Object(details))) => {
                let mut fields: Vec<&str> = details.keys().map(String::as_str).collect();
                fields.sort();
                assert_eq!(fields, vec!["message", "recipientEmail", "scheduledDate", "senderName"]);
            }
            other => panic!("expected InvalidPayload, got {:?}", other),
        }
    }
}
