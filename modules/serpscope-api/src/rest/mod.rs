use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use serpscope_common::SerpscopeError;

use crate::AppState;

const PROMPT_REQUIRED: &str = "Prompt is required";

/// Non-standard "client closed request" status.
const CLIENT_CLOSED_REQUEST: u16 = 499;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    prompt: Option<String>,
}

/// Raises the cancel flag when the handler future is dropped, which is what
/// axum does when the client goes away mid-request.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub(crate) fn error_response(err: &SerpscopeError) -> Response {
    match err {
        // Only written to a closed connection: the flag is raised once the
        // handler future is dropped, so no client ever reads this status.
        SerpscopeError::Cancelled => StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
            .unwrap_or(StatusCode::BAD_REQUEST)
            .into_response(),
        SerpscopeError::InvalidInput(message) => error_json(StatusCode::BAD_REQUEST, message),
        other => error_json(StatusCode::INTERNAL_SERVER_ERROR, &other.to_string()),
    }
}

pub async fn api_analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let prompt = match body {
        Ok(Json(req)) => req.prompt.filter(|p| !p.trim().is_empty()),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Unreadable analyze request");
            None
        }
    };
    let Some(prompt) = prompt else {
        return error_json(StatusCode::BAD_REQUEST, PROMPT_REQUIRED);
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let _guard = CancelOnDrop(cancel.clone());

    // The run lives in its own task so a disconnect stops it at the next
    // stage boundary instead of mid-request.
    let pipeline = state.pipeline.clone();
    let task = tokio::spawn(async move { pipeline.run(&prompt, &cancel).await });

    match task.await {
        Ok(Ok(outcome)) => {
            info!(run_id = %outcome.run_id, url = %outcome.url, "Analysis saved");
            Json(serde_json::json!({ "success": true, "url": outcome.url })).into_response()
        }
        Ok(Err(e)) => {
            if e.is_cancelled() {
                info!("Analysis cancelled by client");
            } else {
                error!(error = %e, "Analysis failed");
            }
            error_response(&e)
        }
        Err(e) => {
            error!(error = %e, "Analysis task panicked");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}
