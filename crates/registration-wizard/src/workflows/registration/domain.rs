use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest résumé the form accepts, in bytes.
pub const MAX_RESUME_BYTES: usize = 2 * 1024 * 1024;

/// Every input the registration form collects, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldName {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "phone")]
    Phone,
    #[serde(rename = "gender")]
    Gender,
    #[serde(rename = "dob")]
    DateOfBirth,
    #[serde(rename = "certificateNo")]
    CertificateNo,
    #[serde(rename = "degree")]
    Degree,
    #[serde(rename = "yop")]
    YearOfPassing,
    #[serde(rename = "fresher")]
    Fresher,
    #[serde(rename = "relevantExp")]
    RelevantExperience,
    #[serde(rename = "otherExp")]
    OtherExperience,
    #[serde(rename = "expertise")]
    Expertise,
    #[serde(rename = "currentCTC")]
    CurrentCtc,
    #[serde(rename = "expectedCTC")]
    ExpectedCtc,
    #[serde(rename = "notice")]
    Notice,
    #[serde(rename = "noticeDays")]
    NoticeDays,
    #[serde(rename = "noticeServingTill")]
    NoticeServingTill,
    #[serde(rename = "knownThrough")]
    KnownThrough,
    #[serde(rename = "resume")]
    Resume,
}

impl FieldName {
    pub const fn text_fields() -> [Self; 18] {
        [
            Self::Name,
            Self::Email,
            Self::Phone,
            Self::Gender,
            Self::DateOfBirth,
            Self::CertificateNo,
            Self::Degree,
            Self::YearOfPassing,
            Self::Fresher,
            Self::RelevantExperience,
            Self::OtherExperience,
            Self::Expertise,
            Self::CurrentCtc,
            Self::ExpectedCtc,
            Self::Notice,
            Self::NoticeDays,
            Self::NoticeServingTill,
            Self::KnownThrough,
        ]
    }

    /// Name used on the wire and in the persisted snapshot.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Gender => "gender",
            Self::DateOfBirth => "dob",
            Self::CertificateNo => "certificateNo",
            Self::Degree => "degree",
            Self::YearOfPassing => "yop",
            Self::Fresher => "fresher",
            Self::RelevantExperience => "relevantExp",
            Self::OtherExperience => "otherExp",
            Self::Expertise => "expertise",
            Self::CurrentCtc => "currentCTC",
            Self::ExpectedCtc => "expectedCTC",
            Self::Notice => "notice",
            Self::NoticeDays => "noticeDays",
            Self::NoticeServingTill => "noticeServingTill",
            Self::KnownThrough => "knownThrough",
            Self::Resume => "resume",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Gender => "Gender",
            Self::DateOfBirth => "Date of Birth",
            Self::CertificateNo => "10th Certificate No",
            Self::Degree => "Education Qualification",
            Self::YearOfPassing => "Year Of Passing",
            Self::Fresher => "Fresher/Experienced",
            Self::RelevantExperience => "Relevant Experience",
            Self::OtherExperience => "Other Domain Experience",
            Self::Expertise => "Expertise",
            Self::CurrentCtc => "Current CTC",
            Self::ExpectedCtc => "Expected CTC",
            Self::Notice => "Immediate Joiner / Notice Period",
            Self::NoticeDays => "Notice Period - Days",
            Self::NoticeServingTill => "Notice Period - Last Date",
            Self::KnownThrough => "Known of Cetas through",
            Self::Resume => "Resume (PDF, Max 2MB)",
        }
    }

    pub const fn input_kind(self) -> InputKind {
        match self {
            Self::DateOfBirth => InputKind::Date,
            Self::Resume => InputKind::File,
            _ => InputKind::Text,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::text_fields()
            .into_iter()
            .chain(std::iter::once(Self::Resume))
            .find(|field| field.key() == key)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Date,
    File,
}

/// A file the applicant picked for upload, as declared by the browser or file system.
#[derive(Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type
            .parse::<mime::Mime>()
            .map(|parsed| parsed.essence_str() == mime::APPLICATION_PDF.essence_str())
            .unwrap_or(false)
    }
}

impl fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// The single record the wizard builds up. Text fields serialize under their wire names; the
/// résumé never serializes, so the same shape doubles as the persisted snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub dob: String,
    #[serde(rename = "certificateNo")]
    pub certificate_no: String,
    pub degree: String,
    pub yop: String,
    pub fresher: String,
    #[serde(rename = "relevantExp")]
    pub relevant_exp: String,
    #[serde(rename = "otherExp")]
    pub other_exp: String,
    pub expertise: String,
    #[serde(rename = "currentCTC")]
    pub current_ctc: String,
    #[serde(rename = "expectedCTC")]
    pub expected_ctc: String,
    pub notice: String,
    #[serde(rename = "noticeDays")]
    pub notice_days: String,
    #[serde(rename = "noticeServingTill")]
    pub notice_serving_till: String,
    #[serde(rename = "knownThrough")]
    pub known_through: String,
    #[serde(skip)]
    pub resume: Option<ResumeFile>,
}

impl ApplicationForm {
    /// Current value of a text field; `None` for the résumé.
    pub fn value(&self, field: FieldName) -> Option<&str> {
        let value = match field {
            FieldName::Name => &self.name,
            FieldName::Email => &self.email,
            FieldName::Phone => &self.phone,
            FieldName::Gender => &self.gender,
            FieldName::DateOfBirth => &self.dob,
            FieldName::CertificateNo => &self.certificate_no,
            FieldName::Degree => &self.degree,
            FieldName::YearOfPassing => &self.yop,
            FieldName::Fresher => &self.fresher,
            FieldName::RelevantExperience => &self.relevant_exp,
            FieldName::OtherExperience => &self.other_exp,
            FieldName::Expertise => &self.expertise,
            FieldName::CurrentCtc => &self.current_ctc,
            FieldName::ExpectedCtc => &self.expected_ctc,
            FieldName::Notice => &self.notice,
            FieldName::NoticeDays => &self.notice_days,
            FieldName::NoticeServingTill => &self.notice_serving_till,
            FieldName::KnownThrough => &self.known_through,
            FieldName::Resume => return None,
        };
        Some(value.as_str())
    }

    /// Overwrite a text field. Returns `false` for the résumé, which is attached separately.
    pub fn set_value(&mut self, field: FieldName, value: impl Into<String>) -> bool {
        let slot = match field {
            FieldName::Name => &mut self.name,
            FieldName::Email => &mut self.email,
            FieldName::Phone => &mut self.phone,
            FieldName::Gender => &mut self.gender,
            FieldName::DateOfBirth => &mut self.dob,
            FieldName::CertificateNo => &mut self.certificate_no,
            FieldName::Degree => &mut self.degree,
            FieldName::YearOfPassing => &mut self.yop,
            FieldName::Fresher => &mut self.fresher,
            FieldName::RelevantExperience => &mut self.relevant_exp,
            FieldName::OtherExperience => &mut self.other_exp,
            FieldName::Expertise => &mut self.expertise,
            FieldName::CurrentCtc => &mut self.current_ctc,
            FieldName::ExpectedCtc => &mut self.expected_ctc,
            FieldName::Notice => &mut self.notice,
            FieldName::NoticeDays => &mut self.notice_days,
            FieldName::NoticeServingTill => &mut self.notice_serving_till,
            FieldName::KnownThrough => &mut self.known_through,
            FieldName::Resume => return false,
        };
        *slot = value.into();
        true
    }

    /// Copy of the text fields with the attachment dropped.
    pub fn without_resume(&self) -> Self {
        Self {
            resume: None,
            ..self.clone()
        }
    }

    /// Copy of the text fields, each trimmed, with the attachment dropped. This is what gets
    /// recorded, so it matches the values that were validated.
    pub fn trimmed(&self) -> Self {
        let mut form = self.without_resume();
        for field in FieldName::text_fields() {
            if let Some(value) = self.value(field) {
                form.set_value(field, value.trim());
            }
        }
        form
    }
}

/// Payload sent to the form submission endpoint: every text field plus the base64 résumé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(flatten)]
    pub form: ApplicationForm,
    pub resume: String,
}
