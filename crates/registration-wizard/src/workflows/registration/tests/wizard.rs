use super::common::*;
use std::sync::Arc;

use crate::workflows::registration::domain::{ApplicationForm, FieldName, MAX_RESUME_BYTES};
use crate::workflows::registration::persistence::{
    KeyValueStore, PersistenceError, SnapshotStore, FORM_STORAGE_KEY,
};
use crate::workflows::registration::pipeline::{NotificationStatus, SubmissionError};
use crate::workflows::registration::schema::{self, INVALID_PHONE};
use crate::workflows::registration::steps::WizardLayout;
use crate::workflows::registration::wizard::WizardController;

#[test]
fn advance_blocks_on_invalid_fields_and_reports_them() {
    let mut wizard = WizardController::new(Arc::new(MemoryStore::default()));
    wizard.set_field(FieldName::Name, "Asha Rao").expect("persist");
    wizard
        .set_field(FieldName::Email, "asha.rao@example.com")
        .expect("persist");
    wizard.set_field(FieldName::Phone, "12345").expect("persist");
    wizard.set_field(FieldName::Gender, "Female").expect("persist");
    wizard.set_field(FieldName::DateOfBirth, "1998-04-12").expect("persist");

    assert!(!wizard.advance());
    assert_eq!(wizard.step(), 1);
    assert_eq!(wizard.errors().len(), 1);
    assert_eq!(wizard.errors().get(FieldName::Phone), Some(INVALID_PHONE));

    wizard.set_field(FieldName::Phone, "9876543210").expect("persist");
    assert!(wizard.advance());
    assert_eq!(wizard.step(), 2);
    assert!(wizard.errors().is_empty());
}

#[test]
fn advance_only_checks_the_current_step() {
    let mut wizard = WizardController::new(Arc::new(MemoryStore::default()));
    let form = valid_form();
    for field in [
        FieldName::Name,
        FieldName::Email,
        FieldName::Phone,
        FieldName::Gender,
        FieldName::DateOfBirth,
    ] {
        wizard
            .set_field(field, form.value(field).expect("text"))
            .expect("persist");
    }

    assert!(wizard.advance(), "later steps are still empty but not checked");
    assert!(!wizard.advance());
    assert_eq!(wizard.step(), 2);
    let failing: Vec<FieldName> = wizard.errors().fields().collect();
    assert_eq!(
        failing,
        vec![
            FieldName::CertificateNo,
            FieldName::Degree,
            FieldName::YearOfPassing,
            FieldName::Fresher,
            FieldName::RelevantExperience,
            FieldName::OtherExperience,
        ]
    );
}

#[test]
fn advance_succeeds_iff_every_field_in_step_passes() {
    let layout = WizardLayout::standard();
    for step in 1..layout.step_count() {
        let fields = layout.step(step).expect("step").fields.clone();
        for broken in &fields {
            let mut form = valid_form();
            form.set_value(*broken, "");
            let errors = schema::validate_step(&layout, step, &form);
            assert_eq!(
                errors.fields().collect::<Vec<_>>(),
                vec![*broken],
                "blanking {broken} on step {step}"
            );
        }
        assert!(schema::validate_step(&layout, step, &valid_form()).is_empty());
    }
}

#[test]
fn advancing_never_skips_or_overshoots() {
    let mut wizard = completed_wizard(Arc::new(MemoryStore::default()));
    assert_eq!(wizard.step(), 5);
    wizard.select_resume(pdf_resume(1024));
    assert!(wizard.advance());
    assert_eq!(wizard.step(), 5);
}

#[test]
fn retreat_is_unvalidated_and_floored() {
    let mut wizard = WizardController::new(Arc::new(MemoryStore::default()));
    wizard.retreat();
    assert_eq!(wizard.step(), 1);

    let mut wizard = completed_wizard(Arc::new(MemoryStore::default()));
    wizard.set_field(FieldName::Expertise, "").expect("persist");
    wizard.retreat();
    wizard.retreat();
    assert_eq!(wizard.step(), 3, "back navigation ignores invalid fields");
}

#[test]
fn retreat_then_advance_returns_to_same_step_without_data_loss() {
    let mut wizard = completed_wizard(Arc::new(MemoryStore::default()));
    wizard.retreat();
    wizard.retreat();
    let before = wizard.form().clone();
    let step = wizard.step();

    wizard.retreat();
    assert!(wizard.advance());
    assert_eq!(wizard.step(), step);
    assert_eq!(wizard.form(), &before);
}

#[test]
fn every_edit_overwrites_the_snapshot() {
    let store = Arc::new(MemoryStore::default());
    let mut wizard = WizardController::new(store.clone());

    wizard.set_field(FieldName::Name, "Asha").expect("persist");
    wizard.set_field(FieldName::Name, "Asha Rao").expect("persist");

    let raw = store.raw(FORM_STORAGE_KEY).expect("snapshot written");
    let saved: serde_json::Value = serde_json::from_str(&raw).expect("json snapshot");
    assert_eq!(saved["name"], "Asha Rao");
    assert_eq!(saved["knownThrough"], "");
    assert!(saved.get("resume").is_none());
}

#[test]
fn restore_reproduces_everything_but_the_resume() {
    let store = Arc::new(MemoryStore::default());
    let mut wizard = completed_wizard(store.clone());
    wizard.select_resume(pdf_resume(2048));
    let answered = wizard.form().clone();
    drop(wizard);

    let reloaded = WizardController::mount(store).expect("mount restores");
    assert_eq!(reloaded.form(), &answered.without_resume());
    assert!(reloaded.form().resume.is_none());
    assert_eq!(reloaded.step(), 1, "step index is not persisted");
}

#[test]
fn mount_without_snapshot_starts_empty() {
    let wizard = WizardController::mount(Arc::new(MemoryStore::default())).expect("mount");
    assert_eq!(wizard.form(), &ApplicationForm::default());
}

#[test]
fn unreadable_snapshot_is_discarded_on_mount() {
    let store = Arc::new(MemoryStore::default());
    store
        .set(FORM_STORAGE_KEY, "{\"name\":\"Asha\",")
        .expect("write truncated snapshot");

    let mut wizard = WizardController::mount(store.clone()).expect("mount recovers");
    assert_eq!(wizard.form(), &ApplicationForm::default());
    assert!(store.raw(FORM_STORAGE_KEY).is_none(), "bad snapshot erased");

    wizard.set_field(FieldName::Name, "Asha Rao").expect("persist");
    let reloaded = WizardController::mount(store).expect("remount");
    assert_eq!(reloaded.form().name, "Asha Rao");
}

#[test]
fn storage_failures_surface_to_the_caller() {
    assert!(matches!(
        WizardController::mount(Arc::new(UnavailableStore)),
        Err(PersistenceError::Io(_))
    ));

    let mut wizard = WizardController::new(Arc::new(UnavailableStore));
    let result = wizard.set_field(FieldName::Name, "Asha Rao");
    assert!(result.is_err());
    assert_eq!(wizard.form().name, "Asha Rao", "the edit itself is kept");
}

#[test]
fn resume_is_not_a_text_field() {
    let mut wizard = WizardController::new(Arc::new(MemoryStore::default()));
    assert!(!wizard.set_field(FieldName::Resume, "cv.pdf").expect("no-op"));
}

#[test]
fn selecting_files_replaces_and_revokes_previews() {
    let mut wizard = WizardController::new(Arc::new(MemoryStore::default()));

    wizard.select_resume(pdf_resume(1024));
    let first = wizard.preview().cloned().expect("pdf preview");
    assert_eq!(wizard.previews().live_count(), 1);

    wizard.select_resume(pdf_resume(4096));
    let second = wizard.preview().cloned().expect("replacement preview");
    assert_ne!(first, second);
    assert_eq!(wizard.previews().live_count(), 1);

    wizard.select_resume(word_resume());
    assert!(wizard.preview().is_none());
    assert_eq!(wizard.previews().live_count(), 0);
    assert!(wizard.errors().is_empty(), "no error at selection time");
    assert!(wizard.form().resume.is_some());
}

#[tokio::test]
async fn submit_requires_the_final_step() {
    let harness = harness(&[], SubmitBehavior::Accept, false);
    let mut wizard = WizardController::new(Arc::new(MemoryStore::default()));
    assert!(matches!(
        wizard.submit(&harness.pipeline).await,
        Err(SubmissionError::NotOnFinalStep)
    ));
    assert!(calls(&harness.log).is_empty());
}

#[tokio::test]
async fn resume_boundary_is_inclusive() {
    let harness = harness(&[], SubmitBehavior::Accept, false);

    let mut wizard = completed_wizard(Arc::new(MemoryStore::default()));
    wizard.select_resume(pdf_resume(MAX_RESUME_BYTES));
    wizard
        .submit(&harness.pipeline)
        .await
        .expect("exactly 2 MiB is accepted");

    let mut wizard = completed_wizard(Arc::new(MemoryStore::default()));
    wizard.select_resume(pdf_resume(MAX_RESUME_BYTES + 1));
    let err = wizard
        .submit(&harness.pipeline)
        .await
        .expect_err("one byte over is rejected");
    assert!(matches!(err, SubmissionError::ResumeTooLarge));
    assert_eq!(
        wizard.errors().get(FieldName::Resume),
        Some("Resume must be under 2MB")
    );
}

#[tokio::test]
async fn submit_without_resume_is_rejected_before_any_call() {
    let harness = harness(&[], SubmitBehavior::Accept, false);
    let mut wizard = completed_wizard(Arc::new(MemoryStore::default()));

    let err = wizard.submit(&harness.pipeline).await.expect_err("no resume");
    assert!(matches!(err, SubmissionError::MissingResume));
    assert!(calls(&harness.log).is_empty());

    wizard.select_resume(word_resume());
    let err = wizard.submit(&harness.pipeline).await.expect_err("not a pdf");
    assert_eq!(err.user_message(), "Please upload a PDF file");
    assert!(calls(&harness.log).is_empty());
}

#[tokio::test]
async fn duplicate_email_keeps_the_form() {
    let harness = harness(&["taken@example.com"], SubmitBehavior::Accept, false);
    let store = Arc::new(MemoryStore::default());
    let mut wizard = completed_wizard(store.clone());
    wizard
        .set_field(FieldName::Email, "taken@example.com")
        .expect("persist");
    wizard.select_resume(pdf_resume(4096));

    let err = wizard.submit(&harness.pipeline).await.expect_err("duplicate");
    assert!(matches!(err, SubmissionError::DuplicateEmail));
    assert_eq!(err.user_message(), "Email already exists");
    assert_eq!(wizard.form().email, "taken@example.com");
    assert_eq!(wizard.form().name, "Asha Rao");
    assert!(wizard.form().resume.is_some());
    assert!(store.load().expect("load").is_some(), "snapshot retained");
    assert_eq!(calls(&harness.log), vec!["check_email"]);
}

#[tokio::test]
async fn successful_submission_resets_everything() {
    let harness = harness(&[], SubmitBehavior::Accept, false);
    let store = Arc::new(MemoryStore::default());
    let mut wizard = completed_wizard(store.clone());
    wizard.select_resume(pdf_resume(4096));

    let receipt = wizard.submit(&harness.pipeline).await.expect("submitted");

    assert_eq!(receipt.message, "Form submitted!");
    assert_eq!(receipt.email, "asha.rao@example.com");
    assert_eq!(receipt.notification, NotificationStatus::Sent);
    assert_eq!(
        calls(&harness.log),
        vec!["check_email", "submit_form", "notify"]
    );
    assert_eq!(wizard.step(), 1);
    assert_eq!(wizard.form(), &ApplicationForm::default());
    assert!(wizard.preview().is_none());
    assert_eq!(wizard.previews().live_count(), 0);
    assert!(store.raw(FORM_STORAGE_KEY).is_none());
    assert_eq!(harness.notifier.sent(), vec!["asha.rao@example.com"]);
}

#[tokio::test]
async fn notification_failure_does_not_undo_success() {
    let harness = harness(&[], SubmitBehavior::Accept, true);
    let store = Arc::new(MemoryStore::default());
    let mut wizard = completed_wizard(store.clone());
    wizard.select_resume(pdf_resume(4096));

    let receipt = wizard.submit(&harness.pipeline).await.expect("submitted");
    assert!(matches!(receipt.notification, NotificationStatus::Failed(_)));
    assert_eq!(wizard.form(), &ApplicationForm::default());
    assert!(store.raw(FORM_STORAGE_KEY).is_none());
}

#[tokio::test]
async fn rejected_submission_keeps_form_and_final_step() {
    let harness = harness(&[], SubmitBehavior::Reject("quota exceeded"), false);
    let store = Arc::new(MemoryStore::default());
    let mut wizard = completed_wizard(store.clone());
    wizard.select_resume(pdf_resume(4096));
    let before = wizard.form().clone();

    let err = wizard.submit(&harness.pipeline).await.expect_err("rejected");
    assert_eq!(err.user_message(), "Failed to submit: quota exceeded");
    assert_eq!(wizard.step(), 5);
    assert_eq!(wizard.form(), &before);
    assert!(store.raw(FORM_STORAGE_KEY).is_some());
    assert!(harness.notifier.sent().is_empty());
}

#[tokio::test]
async fn transport_failure_is_generic() {
    let harness = harness(&[], SubmitBehavior::Unreachable, false);
    let mut wizard = completed_wizard(Arc::new(MemoryStore::default()));
    wizard.select_resume(pdf_resume(4096));

    let err = wizard.submit(&harness.pipeline).await.expect_err("unreachable");
    assert_eq!(err.user_message(), "Failed to submit the form");
    assert_eq!(wizard.form().name, "Asha Rao");
}

#[tokio::test]
async fn invalid_fields_at_submit_jump_to_first_failing_step() {
    let harness = harness(&[], SubmitBehavior::Accept, false);
    let mut wizard = completed_wizard(Arc::new(MemoryStore::default()));
    wizard.select_resume(pdf_resume(4096));
    wizard.set_field(FieldName::ExpectedCtc, " ").expect("persist");
    wizard.set_field(FieldName::KnownThrough, "").expect("persist");

    let err = wizard.submit(&harness.pipeline).await.expect_err("invalid");
    assert!(matches!(err, SubmissionError::Invalid(_)));
    assert_eq!(wizard.step(), 3);
    assert_eq!(
        wizard.errors().fields().collect::<Vec<_>>(),
        vec![FieldName::ExpectedCtc]
    );
    assert!(calls(&harness.log).is_empty());
}
