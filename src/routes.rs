use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::TryStreamExt;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::GenerationRequest;
use crate::openai::{CompletionBackend, OpenAiError};
use crate::prompt::{build_prompt, Language};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn CompletionBackend>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid language")]
    InvalidLanguage,
    #[error(transparent)]
    Upstream(#[from] OpenAiError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidLanguage => (StatusCode::BAD_REQUEST, "Invalid language"),
            ApiError::Upstream(e) => {
                // Upstream detail goes to the log, never to the client.
                tracing::error!("❌ Generation failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[axum::debug_handler]
pub async fn generate_crud(
    State(state): State<AppState>,
    Json(body): Json<GenerationRequest>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let Some(language) = Language::parse(&body.language) else {
        tracing::warn!(%request_id, language = %body.language, "Rejecting unrecognized target language");
        return Err(ApiError::InvalidLanguage);
    };

    tracing::info!(
        %request_id,
        entity = %body.entity,
        language = %language,
        fields = body.fields.len(),
        stream = body.stream,
        "🚀 Generating CRUD scaffold"
    );

    let prompt = build_prompt(language, &body.entity, &body.fields, body.database);
    let system = language.system_message();

    if body.stream {
        let deltas = state.backend.stream_completion(system, &prompt).await?;
        let response_body = Body::from_stream(deltas.map_ok(Bytes::from));
        Ok(([(header::CONTENT_TYPE, "application/json")], response_body).into_response())
    } else {
        let sections = state.backend.complete(system, &prompt).await?;
        tracing::info!(%request_id, sections = sections.len(), "✅ Scaffold generated");
        Ok(Json(serde_json::Value::Object(sections)).into_response())
    }
}
