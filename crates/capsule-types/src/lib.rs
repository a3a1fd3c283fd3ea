pub mod api;
pub mod models;

pub use models::{CapsuleStatus, CreateTimeCapsuleInput, EmailMessage, TimeCapsule};
