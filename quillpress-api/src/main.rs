use crate::server::ServerState;
use quillpress_common::{
    model::auth::TokenSigner,
    util::{NonPositiveDurationError, PositiveDuration},
};
use quillpress_db::client::{DbClient, DbError};
use serde::Deserialize;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use thiserror::Error;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error setting up database: {0}")]
    Database(#[from] DbError),
    #[error("Token TTL must be positive: {0}")]
    TokenTtl(#[from] NonPositiveDurationError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    database_url: String,
    token_secret: String,
    #[serde(default = "default_token_ttl_seconds")]
    token_ttl_seconds: i64,
}

fn default_token_ttl_seconds() -> i64 {
    Duration::days(7).whole_seconds()
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "quillpress_api=debug,\
                quillpress_common=debug,\
                quillpress_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Error listening for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let db_client = Arc::new(DbClient::connect(&env.database_url).await?);
    db_client.run_migrations().await?;

    let token_ttl = PositiveDuration::try_from(Duration::seconds(env.token_ttl_seconds))?;
    let token_signer = Arc::new(TokenSigner::new(env.token_secret.as_bytes(), token_ttl));

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes()
        .with_state(ServerState {
            db_client,
            token_signer,
        })
        .layer(tracing_layer);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    debug!(%server_address, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
