//! Direct ID token service binary.

use std::sync::Arc;

use anyhow::Context;
use rust_common::tracing_config::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tracing::{info, warn};

use direct_id_token::Config;
use direct_id_token::http::{AppState, router};
use direct_id_token::issuer::TokenIssuer;
use direct_id_token::shutdown::serve_with_graceful_shutdown;

const SERVICE_NAME: &str = "direct-id-token-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing(&TracingConfig::from_env(SERVICE_NAME))?;

    info!("Starting Direct ID token service");

    let config = Config::from_env().context("invalid service configuration")?;

    let missing = config.direct_id.missing_fields();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "Direct ID configuration incomplete, token requests will fail until it is set"
        );
    }

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let issuer = Arc::new(TokenIssuer::new(config.direct_id));
    let app = router(AppState::new(issuer, config.allow_get), &config.endpoint_path);

    info!(
        %addr,
        path = %config.endpoint_path,
        allow_get = config.allow_get,
        "Direct ID token service listening"
    );

    serve_with_graceful_shutdown(listener, app, config.shutdown_timeout).await?;

    info!("Direct ID token service stopped");

    Ok(())
}
