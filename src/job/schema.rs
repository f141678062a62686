use std::collections::HashMap;

use serde_json::{Map, Value};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use super::JobFields;

/// Raw request fields keyed by their wire name.
pub type FieldMap = Map<String, Value>;

const DEFAULT_SALARY: &str = "Not specified";

/// Writable fields of a posting, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum JobField {
    JobTitle,
    Location,
    Remote,
    EmploymentType,
    Description,
    ApplicationEmail,
    Salary,
    CompanyName,
    Tagline,
    Logo,
    JobCategory,
}

impl JobField {
    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn is_required(self) -> bool {
        !matches!(
            self,
            JobField::Remote | JobField::Salary | JobField::Tagline | JobField::Logo
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    #[error("{0}: Path `{0}` is required.")]
    Required(JobField),
    #[error("{field}: Cast to string failed for value {value} at path \"{field}\"")]
    Cast { field: JobField, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub kind: WriteKind,
    pub errors: Vec<FieldError>,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.kind {
            WriteKind::Create => "Job validation failed",
            WriteKind::Update => "Validation failed",
        };
        let details = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}: {}", prefix, details)
    }
}

impl std::error::Error for SchemaError {}

/// Applies the posting schema to a submitted body.
///
/// `uploaded_logo` is the stored filename of a logo sent with the request.
/// On create it is the only source of `logo`; on update it wins over the
/// submitted `logo` text.
pub fn validate(
    kind: WriteKind,
    body: &FieldMap,
    uploaded_logo: Option<&str>,
) -> Result<JobFields, SchemaError> {
    let mut errors = Vec::new();
    let mut values = HashMap::new();
    for field in JobField::iter().filter(|f| *f != JobField::Remote) {
        // creation never takes the logo name from the body
        if kind == WriteKind::Create && field == JobField::Logo {
            continue;
        }
        match cast_text(field, body.get(field.name())) {
            Ok(value) if field.is_required() && value.as_deref().map_or(true, str::is_empty) => {
                errors.push(FieldError::Required(field));
            }
            Ok(value) => {
                values.insert(field, value);
            }
            Err(e) => errors.push(e),
        }
    }

    let mut take = |field: JobField| values.remove(&field).flatten();
    let mut fields = JobFields {
        job_title: take(JobField::JobTitle).unwrap_or_default(),
        location: take(JobField::Location).unwrap_or_default(),
        remote: is_literal_true(body.get(JobField::Remote.name())),
        employment_type: take(JobField::EmploymentType).unwrap_or_default(),
        description: take(JobField::Description).unwrap_or_default(),
        application_email: take(JobField::ApplicationEmail).unwrap_or_default(),
        salary: take(JobField::Salary),
        company_name: take(JobField::CompanyName).unwrap_or_default(),
        tagline: take(JobField::Tagline),
        logo: take(JobField::Logo),
        job_category: take(JobField::JobCategory).unwrap_or_default(),
    };

    if !errors.is_empty() {
        return Err(SchemaError { kind, errors });
    }

    if let Some(filename) = uploaded_logo {
        fields.logo = Some(filename.to_string());
    }
    if kind == WriteKind::Create {
        fields.salary.get_or_insert_with(|| DEFAULT_SALARY.to_string());
        fields.tagline.get_or_insert_with(String::new);
        fields.logo.get_or_insert_with(String::new);
    }

    Ok(fields)
}

// `remote` is only ever the literal text "true"; a JSON boolean does not count.
fn is_literal_true(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if s == "true")
}

fn cast_text(field: JobField, value: Option<&Value>) -> Result<Option<String>, FieldError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(FieldError::Cast {
            field,
            value: other.to_string(),
        }),
    }
}
