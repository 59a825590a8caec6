use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ConfigArgs;
use crate::error::ServerError;

pub async fn run(args: ConfigArgs) -> Result<(), ServerError> {
    tracing::info!("luafn-server starting");

    let (config, provider) = super::load_provider(&args.config)?;
    tracing::info!(functions = provider.functions().len(), "provider configured");

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    let provider = Arc::new(provider);
    let mut api: JoinHandle<Result<(), String>> = {
        let token = token.clone();
        let bind = config.bind.clone();
        let port = config.api_port;
        tokio::spawn(async move { luafn_api_server::run(&bind, port, provider, token).await })
    };

    tokio::select! {
        res = &mut api => return finish(res),
        sig = tokio::signal::ctrl_c() => {
            sig?;
            tracing::info!("shutting down...");
        }
    }

    token.cancel();
    finish(api.await)
}

fn finish(res: Result<Result<(), String>, tokio::task::JoinError>) -> Result<(), ServerError> {
    match res {
        Ok(Ok(())) => {
            tracing::info!("api server stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(ServerError::Api(e)),
        Err(e) => Err(ServerError::Api(format!("api task: {e}"))),
    }
}
