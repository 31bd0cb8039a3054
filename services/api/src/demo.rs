use crate::infra::{InMemoryApplicantRegistry, InMemoryKeyValueStore, InMemoryMailbox};
use clap::Args;
use registration_wizard::error::AppError;
use registration_wizard::workflows::registration::{
    FieldErrors, FieldName, NotificationStatus, ResumeFile, StepStatus, SubmissionPipeline,
    WizardController, FORM_STORAGE_KEY,
};
use std::sync::Arc;

const DEMO_EMAIL: &str = "meera.iyer@example.com";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Register the demo applicant's email up front so the duplicate check turns them away.
    #[arg(long)]
    pub(crate) duplicate_email: bool,
    /// Run with the form endpoint only: no duplicate check and no confirmation email.
    #[arg(long)]
    pub(crate) reduced: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        duplicate_email,
        reduced,
    } = args;

    let registry = if duplicate_email {
        InMemoryApplicantRegistry::default().with_email(DEMO_EMAIL)
    } else {
        InMemoryApplicantRegistry::default()
    };
    let mailbox = InMemoryMailbox::default();
    let mut pipeline = SubmissionPipeline::new(Arc::new(registry.clone()));
    if !reduced {
        pipeline = pipeline
            .with_email_check(Arc::new(registry.clone()))
            .with_notifier(Arc::new(mailbox.clone()));
    }

    let store = Arc::new(InMemoryKeyValueStore::default());
    let mut wizard = WizardController::mount(store.clone())?;

    println!("Registration wizard demo");
    let stages: Vec<&str> = pipeline.stages().iter().map(|stage| stage.label()).collect();
    println!("Submission stages: {}", stages.join(" -> "));

    println!("\n{}", wizard.progress_label());
    render_steps(&wizard);

    println!("\nAdvancing with nothing filled in");
    if !wizard.advance() {
        render_errors(wizard.errors());
    }

    println!("\nEntering personal info with a short phone number");
    for (field, value) in personal_info() {
        wizard.set_field(field, value)?;
    }
    wizard.set_field(FieldName::Phone, "98765")?;
    if !wizard.advance() {
        render_errors(wizard.errors());
    }
    wizard.set_field(FieldName::Phone, "9876501234")?;

    for (field, value) in remaining_answers() {
        wizard.set_field(field, value)?;
    }
    while !wizard.is_final_step() {
        if !wizard.advance() {
            render_errors(wizard.errors());
            return Err(AppError::Input(format!(
                "demo answers do not satisfy step {}",
                wizard.step()
            )));
        }
        println!("{} ({})", wizard.progress_label(), current_title(&wizard));
    }
    println!(
        "Saved answers on file: {}",
        if store.contains(FORM_STORAGE_KEY) { "yes" } else { "no" }
    );

    println!("\nAttaching a Word document");
    wizard.select_resume(ResumeFile::new(
        "meera-iyer.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        b"PK\x03\x04 word".to_vec(),
    ));
    println!("  Preview: {}", preview_label(&wizard));
    if let Err(err) = wizard.submit(&pipeline).await {
        println!("  Submission refused: {}", err.user_message());
    }

    println!("\nAttaching a PDF");
    wizard.select_resume(ResumeFile::new(
        "meera-iyer.pdf",
        "application/pdf",
        b"%PDF-1.7 Meera Iyer resume".to_vec(),
    ));
    println!("  Preview: {}", preview_label(&wizard));
    println!("  Live previews: {}", wizard.previews().live_count());

    match wizard.submit(&pipeline).await {
        Ok(receipt) => {
            println!("  {}", receipt.message);
            let completed: Vec<&str> = receipt.completed.iter().map(|stage| stage.label()).collect();
            println!("  Completed stages: {}", completed.join(", "));
            println!("  Confirmation email: {}", notification_label(&receipt.notification));
            println!("  Wizard reset to {}", wizard.progress_label());
        }
        Err(err) => {
            println!("  Submission failed: {}", err.user_message());
            println!("  Answers kept on {}", wizard.progress_label());
        }
    }
    println!(
        "  Saved answers on file: {}",
        if store.contains(FORM_STORAGE_KEY) { "yes" } else { "no" }
    );

    let records = registry.records();
    println!("\nRecords received by the form endpoint: {}", records.len());
    for record in &records {
        println!(
            "- {} <{}> | {} | resume {} base64 chars",
            record.form.name,
            record.form.email,
            record.form.expertise,
            record.resume.len()
        );
    }
    let sent = mailbox.sent();
    if sent.is_empty() {
        println!("Confirmation emails: none sent");
    } else {
        println!("Confirmation emails: {}", sent.join(", "));
    }

    Ok(())
}

fn render_steps(wizard: &WizardController<InMemoryKeyValueStore>) {
    for view in wizard.layout().views(wizard.step()) {
        let marker = match view.status {
            StepStatus::Completed => "x",
            StepStatus::Current => ">",
            StepStatus::Upcoming => " ",
        };
        let labels: Vec<&str> = view.fields.iter().map(|field| field.label).collect();
        println!("[{marker}] {}. {}: {}", view.number, view.title, labels.join(", "));
    }
}

fn render_errors(errors: &FieldErrors) {
    for (field, message) in errors.iter() {
        println!("  - {}: {}", field.label(), message);
    }
}

fn current_title(wizard: &WizardController<InMemoryKeyValueStore>) -> &'static str {
    wizard
        .layout()
        .step(wizard.step())
        .map(|step| step.title)
        .unwrap_or("unknown")
}

fn preview_label(wizard: &WizardController<InMemoryKeyValueStore>) -> String {
    wizard
        .preview()
        .map(|handle| handle.as_str().to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn notification_label(status: &NotificationStatus) -> String {
    match status {
        NotificationStatus::Sent => "sent".to_string(),
        NotificationStatus::Failed(detail) => format!("failed ({detail})"),
        NotificationStatus::Skipped => "not configured".to_string(),
    }
}

fn personal_info() -> [(FieldName, &'static str); 5] {
    [
        (FieldName::Name, "Meera Iyer"),
        (FieldName::Email, DEMO_EMAIL),
        (FieldName::Phone, "9876501234"),
        (FieldName::Gender, "Female"),
        (FieldName::DateOfBirth, "1994-07-18"),
    ]
}

fn remaining_answers() -> [(FieldName, &'static str); 13] {
    [
        (FieldName::CertificateNo, "ICSE-2010-55102"),
        (FieldName::Degree, "B.Tech"),
        (FieldName::YearOfPassing, "2016"),
        (FieldName::Fresher, "Experienced"),
        (FieldName::RelevantExperience, "6 years"),
        (FieldName::OtherExperience, "1 year support"),
        (FieldName::Expertise, "Data engineering"),
        (FieldName::CurrentCtc, "14 LPA"),
        (FieldName::ExpectedCtc, "18 LPA"),
        (FieldName::Notice, "Immediate"),
        (FieldName::NoticeDays, "0"),
        (FieldName::NoticeServingTill, "2025-10-31"),
        (FieldName::KnownThrough, "LinkedIn"),
    ]
}
