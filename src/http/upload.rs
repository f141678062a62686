use std::path::{Path, PathBuf};

use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{
    error::PayloadError,
    http::{header, StatusCode},
    web, HttpRequest, HttpResponse, ResponseError,
};
use futures_util::StreamExt as _;
use log::{info, warn};
use serde_json::Value;
use tokio::{fs, io::AsyncWriteExt as _};

use crate::{http::response::ErrorBody, job::schema::FieldMap};

/// The only multipart field allowed to carry a file.
pub const LOGO_FIELD: &str = "logo";

const MAX_TEXT_FIELD_BYTES: usize = 1024 * 1024;
const MAX_JSON_BYTES: usize = 100 * 1024;

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_file_bytes: usize,
}

/// A file written to the upload directory under a generated name.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

impl StoredFile {
    pub async fn discard(self) {
        if let Err(e) = fs::remove_file(&self.path).await {
            warn!("failed to remove upload {}: {}", self.filename, e);
        }
    }
}

/// The text fields of a write request plus the logo stored alongside them.
#[derive(Debug, Default)]
pub struct Submission {
    pub fields: FieldMap,
    pub logo: Option<StoredFile>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File too large")]
    FileTooLarge,
    #[error("Field value too long")]
    FieldTooLarge,
    #[error("request body too large")]
    BodyTooLarge,
    #[error("Unexpected field")]
    UnexpectedField(String),
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("failed to read request body: {0}")]
    Payload(#[from] PayloadError),
    #[error("invalid json body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("internal server error while writing file")]
    WriteFile(#[from] std::io::Error),
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::FileTooLarge | UploadError::FieldTooLarge | UploadError::BodyTooLarge => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            UploadError::WriteFile(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self))
    }
}

/// Reads the body of a create or update request.
///
/// Multipart bodies may carry one file under [`LOGO_FIELD`], which is written
/// to disk before this returns. JSON bodies carry fields only. Anything else
/// reads as an empty submission.
pub async fn read_submission(
    req: &HttpRequest,
    payload: web::Payload,
    config: &UploadConfig,
) -> Result<Submission, UploadError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::new(req.headers(), payload);
        let mut submission = Submission::default();
        match read_parts(&mut multipart, config, &mut submission).await {
            Ok(()) => Ok(submission),
            Err(e) => {
                if let Some(file) = submission.logo.take() {
                    file.discard().await;
                }
                warn!("rejected upload: {}", e);
                Err(e)
            }
        }
    } else if content_type.starts_with("application/json") {
        read_json(payload).await
    } else {
        Ok(Submission::default())
    }
}

async fn read_parts(
    multipart: &mut Multipart,
    config: &UploadConfig,
    submission: &mut Submission,
) -> Result<(), UploadError> {
    while let Some(item) = multipart.next().await {
        let mut field = item?;

        let Some(content_disposition) = field.content_disposition().cloned() else {
            continue;
        };
        let Some(name) = content_disposition.get_name().map(str::to_string) else {
            continue;
        };

        match content_disposition.get_filename() {
            None => {
                let value = read_text(&mut field).await?;
                submission.fields.insert(name, Value::String(value));
                continue;
            }
            // an empty file input is sent with `filename=""` and means no file
            Some("") => {
                while let Some(chunk) = field.next().await {
                    chunk?;
                }
                continue;
            }
            Some(_) => {}
        }

        if name != LOGO_FIELD || submission.logo.is_some() {
            return Err(UploadError::UnexpectedField(name));
        }
        let file = store_file(&mut field, config).await?;
        info!("stored upload {} ({} bytes)", file.filename, file.size);
        submission.logo = Some(file);
    }
    Ok(())
}

async fn read_text(field: &mut Field) -> Result<String, UploadError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk?;
        if bytes.len() + data.len() > MAX_TEXT_FIELD_BYTES {
            return Err(UploadError::FieldTooLarge);
        }
        bytes.extend_from_slice(&data);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn store_file(field: &mut Field, config: &UploadConfig) -> Result<StoredFile, UploadError> {
    let filename = generate_filename();
    let path = config.dir.join(&filename);

    let mut file = fs::File::create(&path).await?;
    let written = write_chunks(field, &mut file, config.max_file_bytes).await;
    drop(file);

    match written {
        Ok(size) => Ok(StoredFile {
            filename,
            path,
            size,
        }),
        Err(e) => {
            fs::remove_file(&path).await.ok();
            Err(e)
        }
    }
}

async fn write_chunks(
    field: &mut Field,
    file: &mut fs::File,
    limit: usize,
) -> Result<usize, UploadError> {
    let mut size = 0;
    while let Some(chunk) = field.next().await {
        let data = chunk?;
        size += data.len();
        if size > limit {
            return Err(UploadError::FileTooLarge);
        }
        file.write_all(&data).await?;
    }
    file.flush().await?;
    Ok(size)
}

async fn read_json(mut payload: web::Payload) -> Result<Submission, UploadError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > MAX_JSON_BYTES {
            return Err(UploadError::BodyTooLarge);
        }
        body.extend_from_slice(&chunk);
    }

    if body.is_empty() {
        return Ok(Submission::default());
    }
    let fields = match serde_json::from_slice(&body)? {
        Value::Object(fields) => fields,
        _ => FieldMap::new(),
    };
    Ok(Submission { fields, logo: None })
}

// 16 random bytes as hex, no extension
fn generate_filename() -> String {
    let rand: [u8; 16] = rand::random();
    hex::encode(rand)
}

/// Resolves an uploaded filename inside `dir`, refusing anything that is not
/// a single plain path component.
pub fn resolve(dir: &Path, filename: &str) -> Option<PathBuf> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(name)), None) if name == filename => Some(dir.join(name)),
        _ => None,
    }
}
