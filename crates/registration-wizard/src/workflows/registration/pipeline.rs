use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, warn};

use super::capabilities::{
    CapabilityError, EmailExistenceCheck, FormSubmit, FormSubmitError, NotifyApplicant,
};
use super::domain::{ApplicationForm, FieldName, SubmissionRecord, MAX_RESUME_BYTES};
use super::schema::{self, FieldErrors};
use super::webhook::{EmailCheckWebhook, FormSubmitWebhook, QrEmailWebhook, WebhookTrigger};
use crate::config::{ConfigError, WebhookConfig};

pub const SUCCESS_MESSAGE: &str = "Form submitted!";

/// Ordered stages of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    ValidateForm,
    CheckResume,
    CheckEmail,
    EncodeResume,
    SubmitForm,
    NotifyApplicant,
}

/// How a stage failure affects the rest of the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageDisposition {
    /// Abort; the failure is not something the applicant can fix.
    BlockingFatal,
    /// Abort; the applicant can correct the input and resubmit.
    BlockingRecoverable,
    /// Log and carry on.
    BestEffort,
}

impl PipelineStage {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::ValidateForm,
            Self::CheckResume,
            Self::CheckEmail,
            Self::EncodeResume,
            Self::SubmitForm,
            Self::NotifyApplicant,
        ]
    }

    pub const fn disposition(self) -> StageDisposition {
        match self {
            Self::ValidateForm | Self::CheckResume | Self::CheckEmail | Self::SubmitForm => {
                StageDisposition::BlockingRecoverable
            }
            Self::EncodeResume => StageDisposition::BlockingFatal,
            Self::NotifyApplicant => StageDisposition::BestEffort,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ValidateForm => "validate form",
            Self::CheckResume => "check resume",
            Self::CheckEmail => "check email",
            Self::EncodeResume => "encode resume",
            Self::SubmitForm => "submit form",
            Self::NotifyApplicant => "notify applicant",
        }
    }
}

/// Applicant-facing reasons a submission stopped. The display text is what gets shown.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Submit is only available on the final step")]
    NotOnFinalStep,
    #[error("Please correct the highlighted fields")]
    Invalid(FieldErrors),
    #[error("Please upload your resume")]
    MissingResume,
    #[error("{}", schema::RESUME_NOT_PDF)]
    ResumeNotPdf,
    #[error("{}", schema::RESUME_TOO_LARGE)]
    ResumeTooLarge,
    #[error("Email already exists")]
    DuplicateEmail,
    #[error("Failed to submit: {0}")]
    Rejected(String),
    #[error("Failed to submit the form")]
    Unexpected { detail: String },
}

impl SubmissionError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self::Unexpected {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Failed(String),
    Skipped,
}

/// What a successful submission reports back.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub email: String,
    pub submitted_at: DateTime<Utc>,
    pub completed: Vec<PipelineStage>,
    pub notification: NotificationStatus,
    pub message: &'static str,
}

#[derive(Debug, thiserror::Error)]
enum StageError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Notification(#[from] CapabilityError),
}

impl StageError {
    fn into_submission(self) -> SubmissionError {
        match self {
            Self::Submission(err) => err,
            Self::Notification(err) => SubmissionError::unexpected(err.to_string()),
        }
    }
}

struct StageContext<'a> {
    form: &'a ApplicationForm,
    encoded_resume: Option<String>,
}

/// Runs the ordered submission stages against the configured capabilities.
///
/// The email check and the notification are optional: a pipeline without them is the reduced
/// single-endpoint configuration and simply skips those stages.
#[derive(Clone)]
pub struct SubmissionPipeline {
    email_check: Option<Arc<dyn EmailExistenceCheck>>,
    form_submit: Arc<dyn FormSubmit>,
    notifier: Option<Arc<dyn NotifyApplicant>>,
}

impl SubmissionPipeline {
    pub fn new(form_submit: Arc<dyn FormSubmit>) -> Self {
        Self {
            email_check: None,
            form_submit,
            notifier: None,
        }
    }

    pub fn with_email_check(mut self, email_check: Arc<dyn EmailExistenceCheck>) -> Self {
        self.email_check = Some(email_check);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotifyApplicant>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Wire the pipeline to the webhook endpoints from configuration.
    pub fn from_webhooks(config: &WebhookConfig) -> Result<Self, ConfigError> {
        let http = Client::new();
        let send_form = config
            .send_form
            .clone()
            .ok_or(ConfigError::MissingEndpoint("REGISTRATION_SEND_FORM_API"))?;

        let mut pipeline = Self::new(Arc::new(FormSubmitWebhook(WebhookTrigger::new(
            http.clone(),
            send_form,
        ))));
        if let Some(endpoint) = config.check_email.clone() {
            pipeline = pipeline.with_email_check(Arc::new(EmailCheckWebhook(
                WebhookTrigger::new(http.clone(), endpoint),
            )));
        }
        if let Some(endpoint) = config.send_qr.clone() {
            pipeline =
                pipeline.with_notifier(Arc::new(QrEmailWebhook(WebhookTrigger::new(http, endpoint))));
        }
        Ok(pipeline)
    }

    /// Stages this pipeline will attempt, in order.
    pub fn stages(&self) -> Vec<PipelineStage> {
        PipelineStage::ordered()
            .into_iter()
            .filter(|stage| match stage {
                PipelineStage::CheckEmail => self.email_check.is_some(),
                PipelineStage::NotifyApplicant => self.notifier.is_some(),
                _ => true,
            })
            .collect()
    }

    /// Run every configured stage in order, stopping at the first blocking failure. Stages that
    /// already completed are not undone.
    pub async fn run(&self, form: &ApplicationForm) -> Result<SubmissionReceipt, SubmissionError> {
        let mut context = StageContext {
            form,
            encoded_resume: None,
        };
        let mut completed = Vec::new();
        let mut notification = NotificationStatus::Skipped;

        for stage in self.stages() {
            match self.execute(stage, &mut context).await {
                Ok(()) => {
                    info!(stage = stage.label(), "registration stage completed");
                    if stage == PipelineStage::NotifyApplicant {
                        notification = NotificationStatus::Sent;
                    }
                    completed.push(stage);
                }
                Err(err) => match stage.disposition() {
                    StageDisposition::BestEffort => {
                        warn!(stage = stage.label(), error = %err, "best-effort stage failed");
                        notification = NotificationStatus::Failed(err.to_string());
                    }
                    StageDisposition::BlockingRecoverable | StageDisposition::BlockingFatal => {
                        let err = err.into_submission();
                        match &err {
                            SubmissionError::Unexpected { detail } => {
                                error!(stage = stage.label(), %detail, "registration submission failed")
                            }
                            other => {
                                info!(stage = stage.label(), reason = %other, "registration submission stopped")
                            }
                        }
                        return Err(err);
                    }
                },
            }
        }

        Ok(SubmissionReceipt {
            email: form.email.trim().to_string(),
            submitted_at: Utc::now(),
            completed,
            notification,
            message: SUCCESS_MESSAGE,
        })
    }

    async fn execute(
        &self,
        stage: PipelineStage,
        context: &mut StageContext<'_>,
    ) -> Result<(), StageError> {
        let form = context.form;
        match stage {
            PipelineStage::ValidateForm => {
                let mut errors = FieldErrors::default();
                for field in FieldName::text_fields() {
                    if let Some(message) = schema::validate_field(field, form) {
                        errors.insert(field, message);
                    }
                }
                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(SubmissionError::Invalid(errors).into())
                }
            }
            PipelineStage::CheckResume => {
                let file = form.resume.as_ref().ok_or(SubmissionError::MissingResume)?;
                if !file.is_pdf() {
                    return Err(SubmissionError::ResumeNotPdf.into());
                }
                if file.size() > MAX_RESUME_BYTES {
                    return Err(SubmissionError::ResumeTooLarge.into());
                }
                Ok(())
            }
            PipelineStage::CheckEmail => match &self.email_check {
                Some(check) if check.email_exists(form.email.trim()).await => {
                    Err(SubmissionError::DuplicateEmail.into())
                }
                _ => Ok(()),
            },
            PipelineStage::EncodeResume => {
                let file = form
                    .resume
                    .as_ref()
                    .ok_or_else(|| SubmissionError::unexpected("resume detached mid-submission"))?;
                context.encoded_resume = Some(STANDARD.encode(&file.bytes));
                Ok(())
            }
            PipelineStage::SubmitForm => {
                let resume = context.encoded_resume.clone().ok_or_else(|| {
                    SubmissionError::unexpected("form submitted before resume was encoded")
                })?;
                let record = SubmissionRecord {
                    form: form.trimmed(),
                    resume,
                };
                self.form_submit
                    .submit_form(&record)
                    .await
                    .map_err(|err| match err {
                        FormSubmitError::Rejected(message) => SubmissionError::Rejected(message),
                        FormSubmitError::Unavailable(source) => {
                            SubmissionError::unexpected(source.to_string())
                        }
                    })?;
                Ok(())
            }
            PipelineStage::NotifyApplicant => match &self.notifier {
                Some(notifier) => Ok(notifier.notify(form.email.trim()).await?),
                None => Ok(()),
            },
        }
    }
}

impl std::fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("stages", &self.stages())
            .finish_non_exhaustive()
    }
}
