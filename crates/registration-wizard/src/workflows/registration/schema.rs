//! Declarative field rules for the registration form.
//!
//! Validation is a pure function of the form contents: a step maps to the rules for its fields
//! and the result is a set of field-level messages ready for inline display.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::domain::{ApplicationForm, FieldName, ResumeFile, MAX_RESUME_BYTES};
use super::steps::WizardLayout;

pub const INVALID_EMAIL: &str = "Invalid email";
pub const INVALID_PHONE: &str = "Phone must be 10 digits";
pub const RESUME_NOT_PDF: &str = "Please upload a PDF file";
pub const RESUME_TOO_LARGE: &str = "Resume must be under 2MB";

/// Rule attached to a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Required,
    Email,
    TenDigitPhone,
    PdfAttachment { max_bytes: usize },
}

impl FieldRule {
    pub const fn for_field(field: FieldName) -> Self {
        match field {
            FieldName::Email => Self::Email,
            FieldName::Phone => Self::TenDigitPhone,
            FieldName::Resume => Self::PdfAttachment {
                max_bytes: MAX_RESUME_BYTES,
            },
            _ => Self::Required,
        }
    }
}

/// Per-field messages for the fields that failed their rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FieldName, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn insert(&mut self, field: FieldName, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// Keep only the errors belonging to `fields`.
    pub fn restricted_to(&self, fields: &[FieldName]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(field, _)| fields.contains(field))
                .map(|(field, message)| (*field, message.clone()))
                .collect(),
        )
    }
}

/// Check one field of `form` against its rule.
pub fn validate_field(field: FieldName, form: &ApplicationForm) -> Option<String> {
    match FieldRule::for_field(field) {
        FieldRule::PdfAttachment { max_bytes } => {
            form.resume.as_ref().and_then(|file| check_resume(file, max_bytes))
        }
        rule => {
            let value = form.value(field).unwrap_or_default();
            check_text(rule, field, value)
        }
    }
}

/// Validate only the fields grouped under `step`. Unknown steps have nothing to validate.
pub fn validate_step(layout: &WizardLayout, step: usize, form: &ApplicationForm) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if let Some(definition) = layout.step(step) {
        for field in &definition.fields {
            if let Some(message) = validate_field(*field, form) {
                errors.insert(*field, message);
            }
        }
    }
    errors
}

/// Validate the whole form, step by step.
pub fn validate_form(layout: &WizardLayout, form: &ApplicationForm) -> FieldErrors {
    let mut errors = FieldErrors::default();
    for step in 1..=layout.step_count() {
        for (field, message) in validate_step(layout, step, form).iter() {
            errors.insert(field, message);
        }
    }
    errors
}

/// Size/type check for an attached résumé.
pub fn check_resume(file: &ResumeFile, max_bytes: usize) -> Option<String> {
    if !file.is_pdf() {
        return Some(RESUME_NOT_PDF.to_string());
    }
    if file.size() > max_bytes {
        return Some(RESUME_TOO_LARGE.to_string());
    }
    None
}

fn check_text(rule: FieldRule, field: FieldName, value: &str) -> Option<String> {
    let value = value.trim();
    match rule {
        FieldRule::Email if !is_valid_email(value) => Some(INVALID_EMAIL.to_string()),
        FieldRule::TenDigitPhone if !is_ten_digit_phone(value) => Some(INVALID_PHONE.to_string()),
        FieldRule::Required if value.is_empty() => Some(format!("{} is required", field.label())),
        _ => None,
    }
}

pub fn is_ten_digit_phone(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|byte| byte.is_ascii_digit())
}

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$",
            )
            .ok()
        })
        .as_ref()
}

pub fn is_valid_email(value: &str) -> bool {
    if value.starts_with('.') || value.contains("..") {
        return false;
    }
    email_pattern().is_some_and(|pattern| pattern.is_match(value))
}
