// get /uploads/{filename} where filename was generated by the upload adapter

use actix_web::{get, http::StatusCode, web, HttpResponse, ResponseError};
use tokio::fs;

use crate::{
    http::{response::ErrorBody, upload},
    state::AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("File not found")]
    NotFound,
    #[error("filesystem error: {0}")]
    FilesystemError(#[from] std::io::Error),
}

impl ResponseError for AssetError {
    fn status_code(&self) -> StatusCode {
        match self {
            AssetError::NotFound => StatusCode::NOT_FOUND,
            AssetError::FilesystemError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self))
    }
}

#[get("/uploads/{filename}")]
pub async fn serve_upload(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AssetError> {
    let filename = path.into_inner();
    let file_path = upload::resolve(&state.uploads.dir, &filename).ok_or(AssetError::NotFound)?;

    let bytes = fs::read(&file_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AssetError::NotFound
        } else {
            AssetError::FilesystemError(e)
        }
    })?;

    let mime = mime_guess::from_path(&file_path)
        .first_or_octet_stream()
        .to_string();

    Ok(HttpResponse::Ok()
        .insert_header(("Content-Type", mime))
        .body(bytes))
}
