use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use luafn_api::DynamicValue;
use luafn_engine::CallFailure;

use super::AppState;

// ═══════════════════════════════════════════════════════════════
//  REST: GET /api/functions
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_list_functions(State(state): State<AppState>) -> Response {
    axum::Json(state.provider.functions()).into_response()
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /api/schema
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_schema(State(state): State<AppState>) -> Response {
    axum::Json(state.provider.schema()).into_response()
}

// ═══════════════════════════════════════════════════════════════
//  REST: POST /api/functions/{name}/call
// ═══════════════════════════════════════════════════════════════

#[derive(Deserialize)]
pub(crate) struct CallRequest {
    #[serde(default)]
    arguments: Vec<DynamicValue>,
}

pub(crate) async fn handle_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<axum::Json<CallRequest>, JsonRejection>,
) -> Response {
    let axum::Json(request) = match body {
        Ok(b) => b,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("error: {e}")).into_response(),
    };

    // Each call builds and drops its own interpreter; keep it off the
    // async workers.
    let provider = state.provider.clone();
    let call_name = name.clone();
    let outcome = tokio::task::spawn_blocking(move || provider.call(&call_name, &request.arguments)).await;

    match outcome {
        Ok(Ok(result)) => axum::Json(serde_json::json!({ "result": result })).into_response(),
        Ok(Err(CallFailure::Function(e))) => axum::Json(serde_json::json!({ "error": e })).into_response(),
        Ok(Err(e @ CallFailure::UnknownFunction(_))) => {
            (StatusCode::NOT_FOUND, format!("error: {e}")).into_response()
        }
        Err(e) => {
            tracing::error!(function = %name, error = %e, "call task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("error: {e}")).into_response()
        }
    }
}
