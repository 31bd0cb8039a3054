use clap::Args;
use registration_wizard::config::AppConfig;
use registration_wizard::error::AppError;
use registration_wizard::telemetry;
use registration_wizard::workflows::registration::{
    ApplicationForm, FieldName, FileKeyValueStore, NotificationStatus, ResumeFile,
    SnapshotStore, SubmissionPipeline, WizardController,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// JSON file with the applicant's answers, keyed by form field name. Without it the answers
    /// saved by a previous run are used.
    #[arg(long)]
    pub(crate) answers: Option<PathBuf>,
    /// Résumé to attach; its content type is guessed from the file extension.
    #[arg(long)]
    pub(crate) resume: PathBuf,
}

pub(crate) async fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let SubmitArgs { answers, resume } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;

    let pipeline = SubmissionPipeline::from_webhooks(&config.webhooks)?;
    let store = Arc::new(FileKeyValueStore::new(&config.storage.snapshot_dir));
    let mut wizard = WizardController::mount(store)?;

    if let Some(path) = answers {
        let form = load_answers(&path)?;
        apply_answers(&mut wizard, &form)?;
        info!(path = %path.display(), "loaded answers");
    }

    while !wizard.is_final_step() {
        if !wizard.advance() {
            for (field, message) in wizard.errors().iter() {
                println!("{}: {}", field.label(), message);
            }
            return Err(AppError::Input(format!(
                "answers are incomplete at {}",
                wizard.progress_label()
            )));
        }
    }

    wizard.select_resume(load_resume(&resume)?);

    match wizard.submit(&pipeline).await {
        Ok(receipt) => {
            println!("{}", receipt.message);
            match receipt.notification {
                NotificationStatus::Sent => println!("Confirmation email sent to {}", receipt.email),
                NotificationStatus::Failed(detail) => {
                    println!("Confirmation email could not be sent: {detail}")
                }
                NotificationStatus::Skipped => {}
            }
            Ok(())
        }
        Err(err) => {
            println!("{}", err.user_message());
            for (field, message) in wizard.errors().iter() {
                println!("{}: {}", field.label(), message);
            }
            Err(err.into())
        }
    }
}

fn apply_answers<S>(wizard: &mut WizardController<S>, form: &ApplicationForm) -> Result<(), AppError>
where
    S: SnapshotStore + 'static,
{
    for field in FieldName::text_fields() {
        match form.value(field) {
            Some(value) if !value.trim().is_empty() => {
                wizard.set_field(field, value)?;
            }
            _ => {}
        }
    }
    Ok(())
}

pub(crate) fn load_answers(path: &Path) -> Result<ApplicationForm, AppError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| {
        AppError::Input(format!("{} is not a valid answers file: {err}", path.display()))
    })
}

pub(crate) fn load_resume(path: &Path) -> Result<ResumeFile, AppError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::Input(format!("{} is not a file", path.display())))?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();

    Ok(ResumeFile::new(file_name, content_type.essence_str(), bytes))
}
