//! Email delivery adapters.

pub mod error;
pub mod logging;
pub mod sendgrid;

pub use error::MailError;
pub use logging::LogEmailService;
pub use sendgrid::SendGridEmailService;
