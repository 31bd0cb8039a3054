use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use registration_wizard::workflows::registration::{
    CapabilityError, EmailExistenceCheck, FormSubmit, FormSubmitError, KeyValueStore,
    NotifyApplicant, PersistenceError, SubmissionRecord,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key);
        Ok(())
    }
}

/// Applicant registry standing in for the email lookup and the form endpoint at once: accepted
/// records become known emails.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicantRegistry {
    emails: Arc<Mutex<BTreeSet<String>>>,
    records: Arc<Mutex<Vec<SubmissionRecord>>>,
}

impl InMemoryApplicantRegistry {
    pub(crate) fn with_email(self, email: &str) -> Self {
        self.emails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(email.to_ascii_lowercase());
        self
    }

    pub(crate) fn records(&self) -> Vec<SubmissionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EmailExistenceCheck for InMemoryApplicantRegistry {
    async fn email_exists(&self, email: &str) -> bool {
        self.emails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email.to_ascii_lowercase())
    }
}

#[async_trait]
impl FormSubmit for InMemoryApplicantRegistry {
    async fn submit_form(&self, record: &SubmissionRecord) -> Result<(), FormSubmitError> {
        let email = record.form.email.to_ascii_lowercase();
        let mut emails = self.emails.lock().unwrap_or_else(PoisonError::into_inner);
        if !emails.insert(email) {
            return Err(FormSubmitError::Rejected(
                "an application with this email is already on file".to_string(),
            ));
        }
        drop(emails);

        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryMailbox {
    sent: Arc<Mutex<Vec<String>>>,
}

impl InMemoryMailbox {
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NotifyApplicant for InMemoryMailbox {
    async fn notify(&self, email: &str) -> Result<(), CapabilityError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.to_string());
        Ok(())
    }
}
