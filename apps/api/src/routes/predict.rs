use std::net::SocketAddr;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        ConnectInfo, Multipart, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::result::ResultRecord;
use crate::routes::session::{new_session_id, session_cookie, session_id};
use crate::screening::{
    self,
    upload::{validate_upload, UploadedDocument, FILE_TOO_LARGE},
};
use crate::state::AppState;
use crate::suggestions;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub redirect_url: &'static str,
}

/// POST /predict
/// Rate limit → validate → model check → extract, clean, classify → suggest →
/// store for `/results`. Only the suggestion step degrades instead of failing.
pub async fn predict_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let client = addr.ip().to_string();
    if !state.rate_limiter.allow(&client).await {
        return Err(AppError::RateLimited);
    }

    let upload = match multipart {
        Ok(multipart) => read_file_part(multipart).await?,
        Err(rejection) => {
            warn!("Request is not a multipart upload: {}", rejection);
            None
        }
    };
    let document = validate_upload(upload)?;
    info!(
        client = %client,
        filename = %document.filename,
        bytes = document.bytes.len(),
        "Upload validated"
    );

    let pipeline = state.models.pipeline()?;

    let classification =
        tokio::task::spawn_blocking(move || screening::screen(&document, &pipeline))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Screening task failed: {e}")))??;
    info!(
        code = classification.code,
        predicted_role = %classification.predicted_role,
        "Prediction made"
    );

    let suggestions = suggestions::suggest(
        &state.llm,
        &classification.cleaned_text,
        &classification.predicted_role,
    )
    .await;

    let (session, issued) = match session_id(&headers) {
        Some(existing) => (existing, false),
        None => (new_session_id(), true),
    };
    state
        .handoff
        .put(&session, ResultRecord::new(classification, suggestions))
        .await?;
    info!("Result stored for retrieval");

    let mut response = Json(PredictResponse {
        success: true,
        redirect_url: "/results",
    })
    .into_response();

    if issued {
        let cookie = session_cookie(&session, state.config.result_ttl_secs);
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid session cookie: {e}")))?;
        response.headers_mut().insert(header::SET_COOKIE, value);
    }

    Ok(response)
}

/// Returns the first `file` part. Other parts are skipped; a form that cannot
/// be parsed has no file part. A body cut off by the request limit is an
/// oversized file, whichever read hits the limit.
async fn read_file_part(mut multipart: Multipart) -> Result<Option<UploadedDocument>, AppError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) if is_over_limit(&e) => return Err(file_too_large()),
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return Ok(None);
            }
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            if is_over_limit(&e) {
                file_too_large()
            } else {
                AppError::Validation(format!("Failed to read upload: {e}"))
            }
        })?;
        return Ok(Some(UploadedDocument {
            filename,
            content_type,
            bytes,
        }));
    }
}

fn is_over_limit(error: &MultipartError) -> bool {
    error.status() == StatusCode::PAYLOAD_TOO_LARGE
}

fn file_too_large() -> AppError {
    AppError::Validation(FILE_TOO_LARGE.to_string())
}
