use anyhow::{Context, Error};
use axum::Router;
use dotenv::dotenv;
use rail_mvt::{
    api::router,
    config::{Config, LogFormat},
    db::{get_db_connector, IndexedStore, PgStore},
    AppState,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let db_pool = get_db_connector(&config).await?;
    let store = PgStore::new(db_pool);

    if store
        .data_present()
        .await
        .context("Failed to inspect database schema")?
    {
        info!("railway tables found");
    } else {
        warn!("railway tables missing, tile and feature requests will fail until ingestion runs");
    }

    let state = AppState {
        store: Arc::new(store),
    };

    let app = router(state, config.request_timeout);

    serve(app, &config).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[cfg(not(feature = "lambda"))]
async fn serve(app: Router, config: &Config) -> Result<(), Error> {
    info!(address = %config.bind_address, "listening");

    axum::Server::bind(&config.bind_address)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Error occurred while starting server")
}

#[cfg(feature = "lambda")]
async fn serve(app: Router, _config: &Config) -> Result<(), Error> {
    let app = tower::ServiceBuilder::new()
        .layer(axum_aws_lambda::LambdaLayer::default())
        .service(app);

    lambda_http::run(app)
        .await
        .map_err(|e| anyhow::anyhow!("Lambda runtime stopped: {}", e))
}

#[cfg(not(feature = "lambda"))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
