use async_trait::async_trait;
use uuid::Uuid;

use crate::job::{Job, JobFields};

mod document;

pub use document::DocumentStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("document snapshot is not valid json: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Exact-match conditions for a listing. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    /// A posting matches when its category equals any of these.
    pub job_categories: Vec<String>,
}

impl JobFilter {
    pub fn categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            job_categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, job: &Job) -> bool {
        self.job_categories.is_empty()
            || self
                .job_categories
                .iter()
                .any(|category| job.fields.job_category == *category)
    }
}

/// Single-document operations over stored postings.
///
/// Every call is its own transaction; concurrent writes to one id resolve
/// as last-write-wins.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Matching postings in insertion order.
    async fn find(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, StoreError>;

    /// Stores a new posting, assigning its id and `postedAt`.
    async fn insert(&self, fields: JobFields) -> Result<Job, StoreError>;

    /// Replaces every writable field of a posting and returns the result.
    async fn update(&self, id: Uuid, fields: JobFields) -> Result<Option<Job>, StoreError>;

    /// Removes a posting and returns its last state.
    async fn delete(&self, id: Uuid) -> Result<Option<Job>, StoreError>;
}
