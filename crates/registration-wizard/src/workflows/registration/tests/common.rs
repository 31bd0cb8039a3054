use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::registration::capabilities::{
    CapabilityError, EmailExistenceCheck, FormSubmit, FormSubmitError, NotifyApplicant,
};
use crate::workflows::registration::domain::{
    ApplicationForm, FieldName, ResumeFile, SubmissionRecord,
};
use crate::workflows::registration::persistence::{KeyValueStore, PersistenceError};
use crate::workflows::registration::pipeline::SubmissionPipeline;
use crate::workflows::registration::wizard::WizardController;

pub(super) type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub(super) fn valid_form() -> ApplicationForm {
    ApplicationForm {
        name: "Asha Rao".to_string(),
        email: "asha.rao@example.com".to_string(),
        phone: "9876543210".to_string(),
        gender: "Female".to_string(),
        dob: "1998-04-12".to_string(),
        certificate_no: "SSC-2014-44817".to_string(),
        degree: "B.Tech".to_string(),
        yop: "2020".to_string(),
        fresher: "Experienced".to_string(),
        relevant_exp: "3 years".to_string(),
        other_exp: "1 year".to_string(),
        expertise: "Data engineering".to_string(),
        current_ctc: "6 LPA".to_string(),
        expected_ctc: "9 LPA".to_string(),
        notice: "Notice Period".to_string(),
        notice_days: "30".to_string(),
        notice_serving_till: "2025-11-30".to_string(),
        known_through: "LinkedIn".to_string(),
        resume: None,
    }
}

pub(super) fn pdf_resume(size: usize) -> ResumeFile {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(size.max(bytes.len()), b'0');
    bytes.truncate(size);
    ResumeFile::new("asha-rao.pdf", "application/pdf", bytes)
}

pub(super) fn word_resume() -> ResumeFile {
    ResumeFile::new(
        "asha-rao.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        vec![0x50, 0x4b, 0x03, 0x04],
    )
}

#[derive(Default)]
pub(super) struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub(super) fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .remove(key);
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
        Err(PersistenceError::Io(std::io::Error::other("storage quota exceeded")))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::Io(std::io::Error::other("storage quota exceeded")))
    }

    fn remove(&self, _key: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::Io(std::io::Error::other("storage quota exceeded")))
    }
}

pub(super) struct FakeEmailCheck {
    taken: Vec<String>,
    log: CallLog,
}

impl FakeEmailCheck {
    pub(super) fn new(taken: &[&str], log: CallLog) -> Self {
        Self {
            taken: taken.iter().map(|email| email.to_string()).collect(),
            log,
        }
    }
}

#[async_trait]
impl EmailExistenceCheck for FakeEmailCheck {
    async fn email_exists(&self, email: &str) -> bool {
        self.log.lock().expect("log mutex").push("check_email");
        self.taken.iter().any(|taken| taken == email)
    }
}

pub(super) enum SubmitBehavior {
    Accept,
    Reject(&'static str),
    Unreachable,
}

pub(super) struct FakeFormSubmit {
    behavior: SubmitBehavior,
    log: CallLog,
    records: Mutex<Vec<SubmissionRecord>>,
}

impl FakeFormSubmit {
    pub(super) fn new(behavior: SubmitBehavior, log: CallLog) -> Self {
        Self {
            behavior,
            log,
            records: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn records(&self) -> Vec<SubmissionRecord> {
        self.records.lock().expect("records mutex").clone()
    }
}

#[async_trait]
impl FormSubmit for FakeFormSubmit {
    async fn submit_form(&self, record: &SubmissionRecord) -> Result<(), FormSubmitError> {
        self.log.lock().expect("log mutex").push("submit_form");
        self.records
            .lock()
            .expect("records mutex")
            .push(record.clone());
        match self.behavior {
            SubmitBehavior::Accept => Ok(()),
            SubmitBehavior::Reject(message) => Err(FormSubmitError::Rejected(message.to_string())),
            SubmitBehavior::Unreachable => Err(FormSubmitError::Unavailable(
                CapabilityError::Transport("connection refused".to_string()),
            )),
        }
    }
}

pub(super) struct FakeNotifier {
    fail: bool,
    log: CallLog,
    sent: Mutex<Vec<String>>,
}

impl FakeNotifier {
    pub(super) fn new(fail: bool, log: CallLog) -> Self {
        Self {
            fail,
            log,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("sent mutex").clone()
    }
}

#[async_trait]
impl NotifyApplicant for FakeNotifier {
    async fn notify(&self, email: &str) -> Result<(), CapabilityError> {
        self.log.lock().expect("log mutex").push("notify");
        self.sent.lock().expect("sent mutex").push(email.to_string());
        if self.fail {
            Err(CapabilityError::Status {
                status: 502,
                body: "mail relay down".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

pub(super) struct Harness {
    pub(super) pipeline: SubmissionPipeline,
    pub(super) form_submit: Arc<FakeFormSubmit>,
    pub(super) notifier: Arc<FakeNotifier>,
    pub(super) log: CallLog,
}

pub(super) fn harness(taken: &[&str], submit: SubmitBehavior, notify_fails: bool) -> Harness {
    let log: CallLog = Arc::default();
    let form_submit = Arc::new(FakeFormSubmit::new(submit, log.clone()));
    let notifier = Arc::new(FakeNotifier::new(notify_fails, log.clone()));
    let pipeline = SubmissionPipeline::new(form_submit.clone())
        .with_email_check(Arc::new(FakeEmailCheck::new(taken, log.clone())))
        .with_notifier(notifier.clone());
    Harness {
        pipeline,
        form_submit,
        notifier,
        log,
    }
}

pub(super) fn calls(log: &CallLog) -> Vec<&'static str> {
    log.lock().expect("log mutex").clone()
}

/// Fill every text field through the controller and walk it to the final step.
pub(super) fn completed_wizard(store: Arc<MemoryStore>) -> WizardController<MemoryStore> {
    let mut wizard = WizardController::new(store);
    let form = valid_form();
    for field in FieldName::text_fields() {
        let value = form.value(field).expect("text field").to_string();
        wizard.set_field(field, value).expect("persist edit");
    }
    while !wizard.is_final_step() {
        assert!(wizard.advance(), "step {} should validate", wizard.step());
    }
    wizard
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
