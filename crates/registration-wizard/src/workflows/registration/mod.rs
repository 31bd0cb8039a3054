//! Five-step job-application registration: declarative step schema, the wizard controller that
//! gates navigation and persists answers, and the submission pipeline that forwards a finished
//! application to the webhook endpoints.

pub mod capabilities;
pub mod domain;
pub mod persistence;
pub mod pipeline;
pub mod preview;
pub mod router;
pub mod schema;
pub mod steps;
pub mod webhook;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use capabilities::{
    CapabilityError, EmailExistenceCheck, FormSubmit, FormSubmitError, NotifyApplicant,
};
pub use domain::{
    ApplicationForm, FieldName, InputKind, ResumeFile, SubmissionRecord, MAX_RESUME_BYTES,
};
pub use persistence::{
    FileKeyValueStore, KeyValueStore, PersistenceError, SnapshotStore, FORM_STORAGE_KEY,
};
pub use pipeline::{
    NotificationStatus, PipelineStage, StageDisposition, SubmissionError, SubmissionPipeline,
    SubmissionReceipt, SUCCESS_MESSAGE,
};
pub use preview::{PreviewHandle, PreviewTracker};
pub use router::{registration_router, RegistrationApi};
pub use schema::{validate_form, validate_step, FieldErrors};
pub use steps::{StepDefinition, StepStatus, StepView, WizardLayout};
pub use webhook::{EmailCheckWebhook, FormSubmitWebhook, QrEmailWebhook, WebhookTrigger};
pub use wizard::{WizardController, WizardState};
