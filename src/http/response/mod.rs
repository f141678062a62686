use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;

use crate::{http::upload::UploadError, job::schema::SchemaError, job::Job, store::StoreError};

/// Body of a successful write: what happened and the resulting record.
#[derive(Serialize)]
pub struct JobMessage {
    pub message: &'static str,
    pub job: Job,
}

impl JobMessage {
    pub fn new(message: &'static str, job: Job) -> Self {
        Self { message, job }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] SchemaError),
    #[error("Job not found")]
    NotFound,
    #[error("invalid query string: {0}")]
    InvalidQuery(String),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upload(e) => e.status_code(),
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Storage(e) = self {
            error!("storage failure: {}", e);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;
    use crate::job::schema::{FieldError, JobField, WriteKind};

    #[actix_web::test]
    async fn errors_render_as_error_objects() {
        let err = ApiError::Validation(SchemaError {
            kind: WriteKind::Create,
            errors: vec![FieldError::Required(JobField::JobTitle)],
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "error": "Job validation failed: jobTitle: Path `jobTitle` is required."
            })
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NotFound.to_string(), "Job not found");

        let query = ApiError::InvalidQuery("unsupported key `category[x]`".into());
        assert_eq!(query.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            query.to_string(),
            "invalid query string: unsupported key `category[x]`"
        );

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let storage = ApiError::Storage(StoreError::Io(io));
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.to_string(), "storage i/o failed: disk gone");

        let upload = ApiError::Upload(UploadError::FileTooLarge);
        assert_eq!(upload.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(upload.to_string(), "File too large");
    }
}
