//! Time capsule use cases.
//!
//! Handlers and the dispatcher construct these with explicit collaborators:
//! a [`TimeCapsuleRepository`], an [`EmailService`] and a [`Clock`].

pub mod clock;
pub mod create;
pub mod email;
pub mod error;
pub mod repository;
pub mod send;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clock::{Clock, SystemClock};
pub use create::CreateTimeCapsule;
pub use email::EmailService;
pub use error::CapsuleError;
pub use repository::TimeCapsuleRepository;
pub use send::{DispatchReport, SendEmail};
