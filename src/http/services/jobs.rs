use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::{
    http::{
        response::{ApiError, JobMessage},
        upload::{read_submission, StoredFile, Submission},
    },
    job::{
        schema::{self, WriteKind},
        Job,
    },
    state::AppState,
    store::JobFilter,
};

const CATEGORY_KEY: &str = "category";

/// Builds the listing filter from the query string.
///
/// `category` may repeat, and `category[]` or `category[0]` name the same
/// list; a posting matches any of the values. A lone empty value is no
/// filter. Any other bracketed `category[...]` key is rejected.
fn category_filter(query: &str) -> Result<JobFilter, ApiError> {
    let pairs = web::Query::<Vec<(String, String)>>::from_query(query)
        .map_err(|e| ApiError::InvalidQuery(e.to_string()))?
        .into_inner();

    let mut categories = Vec::new();
    for (key, value) in pairs {
        let Some(suffix) = key.strip_prefix(CATEGORY_KEY) else {
            continue;
        };
        if suffix.is_empty() || is_list_index(suffix) {
            categories.push(value);
        } else if suffix.starts_with('[') {
            return Err(ApiError::InvalidQuery(format!("unsupported key `{}`", key)));
        }
    }

    if let [only] = categories.as_slice() {
        if only.is_empty() {
            return Ok(JobFilter::default());
        }
    }
    Ok(JobFilter::categories(categories))
}

// `[]` or `[<digits>]`
fn is_list_index(suffix: &str) -> bool {
    suffix
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .is_some_and(|index| index.chars().all(|c| c.is_ascii_digit()))
}

// ids that do not parse cannot name a stored job
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

// a logo stored for a write that then failed is removed again
async fn keep_logo_on_success<T>(
    logo: Option<StoredFile>,
    result: Result<T, ApiError>,
) -> Result<T, ApiError> {
    if result.is_err() {
        if let Some(file) = logo {
            file.discard().await;
        }
    }
    result
}

async fn insert_submission(state: &AppState, submission: &Submission) -> Result<Job, ApiError> {
    let logo = submission.logo.as_ref().map(|f| f.filename.as_str());
    let fields = schema::validate(WriteKind::Create, &submission.fields, logo)?;
    Ok(state.store.insert(fields).await?)
}

// validation runs before the lookup, so an invalid body for an unknown id is a 400
async fn replace_with_submission(
    state: &AppState,
    id: Uuid,
    submission: &Submission,
) -> Result<Job, ApiError> {
    let logo = submission.logo.as_ref().map(|f| f.filename.as_str());
    let fields = schema::validate(WriteKind::Update, &submission.fields, logo)?;
    state.store.update(id, fields).await?.ok_or(ApiError::NotFound)
}

#[get("/jobs")]
pub async fn list_jobs(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let filter = category_filter(req.query_string())?;
    let jobs = state.store.find(&filter).await?;
    Ok(HttpResponse::Ok().json(jobs))
}

#[get("/jobs/{id}")]
pub async fn get_job(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let job = state.store.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(job))
}

#[post("/jobs")]
pub async fn create_job(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let submission = read_submission(&req, payload, &state.uploads).await?;
    let result = insert_submission(&state, &submission).await;
    let job = keep_logo_on_success(submission.logo, result).await?;

    info!("created job {}", job.id);
    Ok(HttpResponse::Created().json(JobMessage::new("Job posted successfully", job)))
}

#[put("/jobs/{id}")]
pub async fn update_job(
    req: HttpRequest,
    path: web::Path<String>,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let submission = read_submission(&req, payload, &state.uploads).await?;
    let result = replace_with_submission(&state, id, &submission).await;
    let job = keep_logo_on_success(submission.logo, result).await?;

    info!("updated job {}", job.id);
    Ok(HttpResponse::Ok().json(JobMessage::new("Job updated successfully", job)))
}

#[delete("/jobs/{id}")]
pub async fn delete_job(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let job = state.store.delete(id).await?.ok_or(ApiError::NotFound)?;

    info!("deleted job {}", job.id);
    Ok(HttpResponse::Ok().json(JobMessage::new("Job deleted successfully", job)))
}
