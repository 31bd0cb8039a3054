use std::sync::Arc;

use tracing::{debug, warn};

use super::domain::{ApplicationForm, FieldName, ResumeFile};
use super::persistence::{PersistenceError, SnapshotStore};
use super::pipeline::{SubmissionError, SubmissionPipeline, SubmissionReceipt};
use super::preview::{PreviewHandle, PreviewTracker};
use super::schema::{self, FieldErrors};
use super::steps::WizardLayout;

/// Ephemeral wizard state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub step: usize,
    pub errors: FieldErrors,
    pub preview: Option<PreviewHandle>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: 1,
            errors: FieldErrors::default(),
            preview: None,
        }
    }
}

/// Drives the wizard: owns the answers, gates step transitions on validation, and keeps the
/// snapshot store in sync with every edit.
pub struct WizardController<S> {
    layout: WizardLayout,
    form: ApplicationForm,
    state: WizardState,
    store: Arc<S>,
    previews: PreviewTracker,
}

impl<S> WizardController<S>
where
    S: SnapshotStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_layout(WizardLayout::standard(), store)
    }

    pub fn with_layout(layout: WizardLayout, store: Arc<S>) -> Self {
        Self {
            layout,
            form: ApplicationForm::default(),
            state: WizardState::default(),
            store,
            previews: PreviewTracker::default(),
        }
    }

    /// Create a controller and repopulate it from the stored snapshot, if one exists.
    pub fn mount(store: Arc<S>) -> Result<Self, PersistenceError> {
        let mut controller = Self::new(store);
        controller.restore()?;
        Ok(controller)
    }

    /// Reload the text fields from the snapshot store. The résumé is never stored, so whatever
    /// is currently attached stays put. Returns whether a snapshot was found.
    ///
    /// A snapshot that no longer parses is discarded so the applicant can start over.
    pub fn restore(&mut self) -> Result<bool, PersistenceError> {
        let snapshot = match self.store.load() {
            Ok(snapshot) => snapshot,
            Err(PersistenceError::Corrupt(err)) => {
                warn!(error = %err, "discarding unreadable registration answers");
                self.store.clear()?;
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        match snapshot {
            Some(saved) => {
                for field in FieldName::text_fields() {
                    if let Some(value) = saved.value(field) {
                        self.form.set_value(field, value);
                    }
                }
                debug!("restored saved registration answers");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Overwrite the stored snapshot with the current text fields.
    pub fn persist(&self) -> Result<(), PersistenceError> {
        self.store.save(&self.form)
    }

    /// Record an edit to a text field and persist. Returns `false` for the résumé, which goes
    /// through [`Self::select_resume`].
    pub fn set_field(
        &mut self,
        field: FieldName,
        value: impl Into<String>,
    ) -> Result<bool, PersistenceError> {
        if !self.form.set_value(field, value) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Validate the current step's fields and move forward if they all pass.
    pub fn advance(&mut self) -> bool {
        let errors = schema::validate_step(&self.layout, self.state.step, &self.form);
        if !errors.is_empty() {
            self.state.errors = errors;
            return false;
        }

        self.state.errors = FieldErrors::default();
        self.state.step = (self.state.step + 1).min(self.layout.step_count());
        true
    }

    /// Step back without validating.
    pub fn retreat(&mut self) {
        self.state.step = self.state.step.saturating_sub(1).max(1);
    }

    /// Attach a résumé. PDFs get a preview; anything else clears the preview but stays attached
    /// so the submit-time check can explain what is wrong.
    pub fn select_resume(&mut self, file: ResumeFile) {
        if let Some(previous) = self.state.preview.take() {
            self.previews.revoke(&previous);
        }
        if file.is_pdf() {
            self.state.preview = Some(self.previews.issue(&file));
        }
        self.form.resume = Some(file);
    }

    /// Submit from the final step. On success the wizard resets and the snapshot is erased;
    /// on failure the answers stay where they are.
    pub async fn submit(
        &mut self,
        pipeline: &SubmissionPipeline,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        if !self.layout.is_final(self.state.step) {
            return Err(SubmissionError::NotOnFinalStep);
        }

        match pipeline.run(&self.form).await {
            Ok(receipt) => {
                self.reset();
                if let Err(err) = self.store.clear() {
                    warn!(error = %err, "failed to erase saved registration answers");
                }
                Ok(receipt)
            }
            Err(err) => {
                self.record_submission_failure(&err);
                Err(err)
            }
        }
    }

    fn record_submission_failure(&mut self, err: &SubmissionError) {
        match err {
            SubmissionError::Invalid(errors) => {
                let first_step = errors
                    .fields()
                    .filter_map(|field| self.layout.step_of(field))
                    .min();
                if let Some(step) = first_step {
                    let fields = self
                        .layout
                        .step(step)
                        .map(|definition| definition.fields.clone())
                        .unwrap_or_default();
                    self.state.step = step;
                    self.state.errors = errors.restricted_to(&fields);
                }
            }
            SubmissionError::MissingResume
            | SubmissionError::ResumeNotPdf
            | SubmissionError::ResumeTooLarge => {
                let mut errors = FieldErrors::default();
                errors.insert(FieldName::Resume, err.user_message());
                self.state.errors = errors;
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        if let Some(preview) = self.state.preview.take() {
            self.previews.revoke(&preview);
        }
        self.form = ApplicationForm::default();
        self.state = WizardState::default();
    }

    pub fn step(&self) -> usize {
        self.state.step
    }

    pub fn is_final_step(&self) -> bool {
        self.layout.is_final(self.state.step)
    }

    pub fn form(&self) -> &ApplicationForm {
        &self.form
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.state.errors
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.state.preview.as_ref()
    }

    pub fn layout(&self) -> &WizardLayout {
        &self.layout
    }

    pub fn previews(&self) -> &PreviewTracker {
        &self.previews
    }

    pub fn progress_label(&self) -> String {
        self.layout.progress_label(self.state.step)
    }
}
