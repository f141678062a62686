use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod schema;

/// A job posting as it is stored and returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: JobFields,
    pub posted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(fields: JobFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            fields,
            posted_at: Utc::now(),
        }
    }
}

/// Every field of a posting that a client may write.
///
/// The optional text fields are `None` only after an update that left them
/// out; creation always fills in the schema defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFields {
    pub job_title: String,
    pub location: String,
    pub remote: bool,
    pub employment_type: String,
    pub description: String,
    pub application_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub job_category: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::JobFields;

    pub fn fields(title: &str, category: &str) -> JobFields {
        JobFields {
            job_title: title.to_string(),
            location: "Remote".to_string(),
            remote: true,
            employment_type: "Full-time".to_string(),
            description: "Build things".to_string(),
            application_email: "a@b.com".to_string(),
            salary: Some("Not specified".to_string()),
            company_name: "Acme".to_string(),
            tagline: Some(String::new()),
            logo: Some(String::new()),
            job_category: category.to_string(),
        }
    }
}
