use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationForm, ResumeFile, MAX_RESUME_BYTES};
use super::pipeline::{SubmissionError, SubmissionPipeline};
use super::schema::{self, RESUME_TOO_LARGE};
use super::steps::WizardLayout;
use crate::error::AppError;

/// Shared state behind the registration endpoints.
#[derive(Clone)]
pub struct RegistrationApi {
    pub pipeline: Arc<SubmissionPipeline>,
    pub layout: Arc<WizardLayout>,
}

impl RegistrationApi {
    pub fn new(pipeline: SubmissionPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            layout: Arc::new(WizardLayout::standard()),
        }
    }
}

/// Résumé as uploaded over HTTP: the file metadata plus base64 contents.
#[derive(Debug, Deserialize)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(flatten)]
    pub form: ApplicationForm,
    #[serde(default)]
    pub resume: Option<ResumeUpload>,
}

// Base64 inflates the largest accepted résumé by a third; leave headroom for the text fields.
const REQUEST_BODY_LIMIT: usize = MAX_RESUME_BYTES * 2;

/// Router builder exposing the wizard layout, per-step validation, and submission.
pub fn registration_router(api: RegistrationApi) -> Router {
    Router::new()
        .route("/api/v1/registration/steps", get(steps_handler))
        .route(
            "/api/v1/registration/steps/:step/validate",
            post(validate_step_handler),
        )
        .route("/api/v1/registration/submit", post(submit_handler))
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
        .with_state(api)
}

pub(crate) async fn steps_handler(State(api): State<RegistrationApi>) -> Response {
    let payload = json!({
        "step_count": api.layout.step_count(),
        "steps": api.layout.views(1),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn validate_step_handler(
    State(api): State<RegistrationApi>,
    Path(step): Path<usize>,
    axum::Json(form): axum::Json<ApplicationForm>,
) -> Response {
    if api.layout.step(step).is_none() {
        let payload = json!({ "error": format!("unknown step {step}") });
        return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
    }

    let errors = schema::validate_step(&api.layout, step, &form);
    if errors.is_empty() {
        let next_step = (step + 1).min(api.layout.step_count());
        let payload = json!({ "valid": true, "next_step": next_step });
        (StatusCode::OK, axum::Json(payload)).into_response()
    } else {
        let payload = json!({ "valid": false, "errors": errors });
        (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
    }
}

/// Bodies over the limit can only be oversized résumés, so they get the résumé size message
/// with `413`. Other malformed bodies keep axum's own rejection.
pub(crate) async fn submit_handler(
    State(api): State<RegistrationApi>,
    payload: Result<axum::Json<SubmitRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            let payload = json!({ "error": RESUME_TOO_LARGE });
            return Ok((StatusCode::PAYLOAD_TOO_LARGE, axum::Json(payload)).into_response());
        }
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let SubmitRequest { mut form, resume } = request;

    if let Some(upload) = resume {
        let bytes = STANDARD
            .decode(upload.data.as_bytes())
            .map_err(|err| AppError::Input(format!("resume is not valid base64: {err}")))?;
        form.resume = Some(ResumeFile::new(upload.file_name, upload.content_type, bytes));
    }

    match api.pipeline.run(&form).await {
        Ok(receipt) => Ok((StatusCode::ACCEPTED, axum::Json(receipt)).into_response()),
        Err(err) => Ok(submission_error_response(err)),
    }
}

fn submission_error_response(err: SubmissionError) -> Response {
    let status = match &err {
        SubmissionError::Invalid(_)
        | SubmissionError::MissingResume
        | SubmissionError::ResumeNotPdf
        | SubmissionError::ResumeTooLarge => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionError::DuplicateEmail => StatusCode::CONFLICT,
        SubmissionError::Rejected(_) => StatusCode::BAD_GATEWAY,
        SubmissionError::NotOnFinalStep => StatusCode::BAD_REQUEST,
        SubmissionError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = match &err {
        SubmissionError::Invalid(errors) => json!({
            "error": err.user_message(),
            "errors": errors,
        }),
        _ => json!({ "error": err.user_message() }),
    };
    (status, axum::Json(payload)).into_response()
}
