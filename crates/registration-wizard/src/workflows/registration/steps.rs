use serde::Serialize;

use super::domain::{FieldName, InputKind};

/// One page of the wizard and the fields it owns.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub title: &'static str,
    pub fields: Vec<FieldName>,
}

/// Fixed ordering of wizard pages. The grouping is configuration; nothing derives it.
#[derive(Debug, Clone)]
pub struct WizardLayout {
    steps: Vec<StepDefinition>,
}

impl WizardLayout {
    pub fn standard() -> Self {
        Self {
            steps: standard_steps(),
        }
    }

    /// Build a layout from custom step definitions. Empty layouts are rejected.
    pub fn from_steps(steps: Vec<StepDefinition>) -> Option<Self> {
        if steps.is_empty() {
            None
        } else {
            Some(Self { steps })
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Look up a step by its 1-based number.
    pub fn step(&self, number: usize) -> Option<&StepDefinition> {
        number.checked_sub(1).and_then(|index| self.steps.get(index))
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// 1-based number of the step that owns `field`.
    pub fn step_of(&self, field: FieldName) -> Option<usize> {
        self.steps
            .iter()
            .position(|step| step.fields.contains(&field))
            .map(|index| index + 1)
    }

    pub fn is_final(&self, number: usize) -> bool {
        number == self.step_count()
    }

    /// Serializable descriptor of every page, marking progress relative to `current`.
    pub fn views(&self, current: usize) -> Vec<StepView> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let number = index + 1;
                StepView {
                    number,
                    title: step.title,
                    status: StepStatus::relative_to(number, current),
                    fields: step
                        .fields
                        .iter()
                        .map(|field| FieldView {
                            name: field.key(),
                            label: field.label(),
                            input: field.input_kind(),
                        })
                        .collect(),
                }
            })
            .collect()
    }

    pub fn progress_label(&self, current: usize) -> String {
        format!("Step {} of {}", current, self.step_count())
    }
}

impl Default for WizardLayout {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

impl StepStatus {
    fn relative_to(number: usize, current: usize) -> Self {
        match number.cmp(&current) {
            std::cmp::Ordering::Less => Self::Completed,
            std::cmp::Ordering::Equal => Self::Current,
            std::cmp::Ordering::Greater => Self::Upcoming,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub number: usize,
    pub title: &'static str,
    pub status: StepStatus,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input: InputKind,
}

fn standard_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition {
            title: "Personal Info",
            fields: vec![
                FieldName::Name,
                FieldName::Email,
                FieldName::Phone,
                FieldName::Gender,
                FieldName::DateOfBirth,
            ],
        },
        StepDefinition {
            title: "Education & Experience",
            fields: vec![
                FieldName::CertificateNo,
                FieldName::Degree,
                FieldName::YearOfPassing,
                FieldName::Fresher,
                FieldName::RelevantExperience,
                FieldName::OtherExperience,
            ],
        },
        StepDefinition {
            title: "Expertise & CTC",
            fields: vec![
                FieldName::Expertise,
                FieldName::CurrentCtc,
                FieldName::ExpectedCtc,
            ],
        },
        StepDefinition {
            title: "Notice & Reference",
            fields: vec![
                FieldName::Notice,
                FieldName::NoticeDays,
                FieldName::NoticeServingTill,
                FieldName::KnownThrough,
            ],
        },
        StepDefinition {
            title: "Resume Upload",
            fields: vec![FieldName::Resume],
        },
    ]
}
