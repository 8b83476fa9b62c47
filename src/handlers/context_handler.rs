use actix_multipart::{Field, Multipart};
use actix_web::{http::header::CONTENT_TYPE, post, web, HttpRequest, HttpResponse};
use futures::StreamExt;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::{AppError, AppResult},
    middleware::get_request_id,
    models::{
        domain::ContextSource,
        dto::{request::ProcessContextRequest, response::ProcessContextResponse},
    },
};

const MISSING_SOURCE: &str = "A file upload or youtubeUrl is required";

/// Accepts either a multipart upload (a file part, or a `youtubeUrl` text
/// part) or a JSON body carrying `youtubeUrl`.
#[post("/process-context")]
pub async fn process_context(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    let limit = state.config.max_upload_bytes;
    let source = if is_multipart(&req) {
        read_multipart(Multipart::new(req.headers(), payload), limit).await?
    } else {
        read_json(payload, limit).await?
    };

    log::info!(
        "[{}] Processing context from {}",
        get_request_id(&req).unwrap_or_default(),
        source.describe()
    );
    let ingested = state.context_service.ingest(source).await?;

    Ok(HttpResponse::Ok().json(ProcessContextResponse {
        context_id: ingested.context_id,
        message: "Context processed successfully".to_string(),
        chunk_count: ingested.chunk_count,
    }))
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn read_multipart(mut multipart: Multipart, limit: usize) -> AppResult<ContextSource> {
    let mut youtube_url: Option<String> = None;

    while let Some(item) = multipart.next().await {
        let mut field =
            item.map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {}", e)))?;

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        if let Some(filename) = filename {
            let content_type = field.content_type().map(|mime| mime.essence_str().to_string());
            let bytes = read_field(&mut field, limit).await?;
            return Ok(ContextSource::Document {
                filename: Some(filename),
                content_type,
                bytes,
            });
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = read_field(&mut field, limit).await?;
        if name == "youtubeUrl" || name == "youtube_url" {
            let url = String::from_utf8_lossy(&value).trim().to_string();
            if !url.is_empty() {
                youtube_url = Some(url);
            }
        }
    }

    youtube_url
        .map(|url| ContextSource::Transcript { url })
        .ok_or_else(|| AppError::ValidationError(MISSING_SOURCE.to_string()))
}

async fn read_field(field: &mut Field, limit: usize) -> AppResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| AppError::ValidationError(format!("Invalid multipart body: {}", e)))?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::IngestionError(format!(
                "Upload exceeds the {} byte limit",
                limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn read_json(mut payload: web::Payload, limit: usize) -> AppResult<ContextSource> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::ValidationError(format!("Invalid body: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(AppError::ValidationError("Request body too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::ValidationError(MISSING_SOURCE.to_string()));
    }

    let request: ProcessContextRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Invalid JSON body: {}", e)))?;
    request.validate()?;

    Ok(ContextSource::Transcript {
        url: request.youtube_url,
    })
}
