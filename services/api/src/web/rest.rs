//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    conversation::Accepted,
    protocol::{ConversationView, MessageView, PhaseView, SenderView},
    state::AppState,
};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use resume_tailor_core::{IgnoreReason, ResumeFile, ResumeFileError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        get_conversation_handler,
        upload_resume_handler,
        submit_message_handler,
        reset_conversation_handler,
    ),
    components(
        schemas(
            HealthResponse,
            SubmitMessageRequest,
            ConversationView,
            MessageView,
            PhaseView,
            SenderView
        )
    ),
    tags(
        (name = "Resume Tailor API", description = "Guided resume and job description fit analysis.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// Text typed into the conversation's input box.
#[derive(Deserialize, ToSchema)]
pub struct SubmitMessageRequest {
    pub text: String,
}

type HandlerError = (StatusCode, String);

/// Maps an ignored input onto the status code a client should see.
fn rejection(reason: IgnoreReason) -> HandlerError {
    let status = match reason {
        IgnoreReason::EmptyInput => StatusCode::BAD_REQUEST,
        IgnoreReason::Busy | IgnoreReason::OutOfPhase | IgnoreReason::MissingResumeFile => {
            StatusCode::CONFLICT
        }
    };
    (status, format!("Input ignored: {}", reason.as_str()))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is running", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Fetch the current conversation.
#[utoipa::path(
    get,
    path = "/conversation",
    responses((status = 200, description = "Current conversation", body = ConversationView))
)]
pub async fn get_conversation_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<ConversationView> {
    Json(app_state.conversation.view().await)
}

/// Upload a resume file.
///
/// Accepts a multipart/form-data request with a `resume_file` part. Only valid
/// while the conversation is collecting the resume.
#[utoipa::path(
    post,
    path = "/conversation/resume",
    request_body(content_type = "multipart/form-data", description = "The resume as `resume_file` (.pdf, .docx or .txt)."),
    responses(
        (status = 200, description = "Resume accepted", body = ConversationView),
        (status = 400, description = "Missing or empty file"),
        (status = 409, description = "Conversation is busy or past the upload step"),
        (status = 415, description = "Unsupported file format")
    )
)]
pub async fn upload_resume_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ConversationView>, HandlerError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        if field.name() != Some("resume_file") {
            continue;
        }
        let name = field
            .file_name()
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    "The resume_file part must carry a file name".to_string(),
                )
            })?
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        upload = Some((name, data));
        break;
    }

    let (name, data) = upload.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "Multipart form must include a resume_file part".to_string(),
        )
    })?;

    let file = ResumeFile::new(name, data).map_err(|e| {
        warn!("Rejected resume upload: {}", e);
        let status = match e {
            ResumeFileError::Empty(_) => StatusCode::BAD_REQUEST,
            ResumeFileError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        };
        (status, e.to_string())
    })?;

    info!(file_name = file.name(), "Resume upload received over REST.");
    app_state
        .conversation
        .submit_file(file)
        .await
        .map(|accepted| Json(accepted.into_view()))
        .map_err(rejection)
}

/// Submit text to the conversation.
///
/// Returns 202 while the remote service works on a job description or a
/// follow-up question; the finished conversation is then available from
/// `GET /conversation` or the `/ws` stream.
#[utoipa::path(
    post,
    path = "/conversation/messages",
    request_body = SubmitMessageRequest,
    responses(
        (status = 200, description = "Text applied", body = ConversationView),
        (status = 202, description = "Request sent to the analysis service", body = ConversationView),
        (status = 400, description = "Blank text"),
        (status = 409, description = "Conversation is busy, or no resume file was uploaded")
    )
)]
pub async fn submit_message_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SubmitMessageRequest>,
) -> Result<(StatusCode, Json<ConversationView>), HandlerError> {
    match app_state.conversation.submit_text(&request.text).await {
        Ok(Accepted::Applied(view)) => Ok((StatusCode::OK, Json(view))),
        Ok(Accepted::Dispatched(view)) => Ok((StatusCode::ACCEPTED, Json(view))),
        Err(reason) => Err(rejection(reason)),
    }
}

/// Start over with a fresh conversation.
#[utoipa::path(
    post,
    path = "/conversation/reset",
    responses((status = 200, description = "Conversation reset", body = ConversationView))
)]
pub async fn reset_conversation_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<ConversationView> {
    Json(app_state.conversation.reset().await)
}
