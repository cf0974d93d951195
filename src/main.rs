mod domain;
mod infra;
mod middleware;
mod report;
mod routes;
mod security;
mod state;

use axum::{Router, routing::get};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infra::db::{connect, init_schema};
use infra::seed::seed_defaults;
use security::config::SecurityConfig;
use security::jwt::JwtManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = connect().await?;
    init_schema(&db).await?;
    seed_defaults(&db).await?;

    let jwt = JwtManager::default();
    let security = SecurityConfig::default();
    let shared_state = state::AppState::new(db, jwt, security);

    let app = Router::new()
        .merge(routes::router(shared_state.clone()))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
