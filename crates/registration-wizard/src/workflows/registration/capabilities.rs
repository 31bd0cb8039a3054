use async_trait::async_trait;

use super::domain::SubmissionRecord;

/// Looks up whether an email address already has an application on record.
///
/// Implementations fail open: anything that prevents an answer is reported as "not on record"
/// so the lookup never blocks a submission on its own.
#[async_trait]
pub trait EmailExistenceCheck: Send + Sync {
    async fn email_exists(&self, email: &str) -> bool;
}

/// Hands the completed application to the system of record.
#[async_trait]
pub trait FormSubmit: Send + Sync {
    async fn submit_form(&self, record: &SubmissionRecord) -> Result<(), FormSubmitError>;
}

/// Triggers the confirmation email carrying the applicant's QR code.
#[async_trait]
pub trait NotifyApplicant: Send + Sync {
    async fn notify(&self, email: &str) -> Result<(), CapabilityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FormSubmitError {
    /// The endpoint answered and refused the record; the message is shown to the applicant.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Unavailable(#[from] CapabilityError),
}

#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("endpoint responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unreadable response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CapabilityError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}
