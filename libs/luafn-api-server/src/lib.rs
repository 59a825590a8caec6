//! HTTP transport for the function provider.

mod http;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio_util::sync::CancellationToken;

use luafn_engine::Provider;

#[derive(Clone)]
pub(crate) struct AppState {
    provider: Arc<Provider>,
}

/// Routes without a listener, for embedding and tests.
pub fn router(provider: Arc<Provider>) -> Router {
    Router::new()
        .route("/api/functions", get(http::handle_list_functions))
        .route("/api/functions/{name}/call", post(http::handle_call))
        .route("/api/schema", get(http::handle_schema))
        .with_state(AppState { provider })
}

/// Serve the provider over HTTP until `shutdown` is cancelled.
pub async fn run(bind: &str, port: u16, provider: Arc<Provider>, shutdown: CancellationToken) -> Result<(), String> {
    let app = router(provider);

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .map_err(|e| format!("bind api {bind}:{port}: {e}"))?;
    tracing::info!(bind = %bind, port, "api server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))?;

    Ok(())
}
