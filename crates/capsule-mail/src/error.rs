use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SendGrid API key is empty")]
    MissingApiKey,

    #[error("email transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
