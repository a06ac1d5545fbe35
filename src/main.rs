//! Agora Back binary entrypoint wiring REST, WebSocket, judging, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dao;
mod dto;
mod error;
mod judge;
mod routes;
mod services;
mod state;

use config::AppConfig;
use dao::{debate_store::DebateStore, memory::MemoryStore, storage::StorageError};
use judge::Judge;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let primary_judge = build_primary_judge(&config);
    let app_state = AppState::new(config, primary_judge);

    tokio::spawn(services::storage_supervisor::run(app_state.clone(), || async {
        let store = MemoryStore::with_seed_topics().await;
        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn DebateStore>)
    }));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Construct the primary verdict provider when the feature and an API key
/// are both present; debates fall back to templated verdicts otherwise.
#[cfg(feature = "openai-judge")]
fn build_primary_judge(config: &AppConfig) -> Option<Arc<dyn Judge>> {
    use judge::{JudgeError, openai::OpenAiJudge};
    use tracing::warn;

    match OpenAiJudge::from_settings(config.judge()) {
        Ok(judge) => {
            info!("primary judge configured");
            Some(Arc::new(judge))
        }
        Err(JudgeError::NotConfigured) => {
            info!("no judge API key present; debates will use fallback verdicts");
            None
        }
        Err(err) => {
            warn!(error = %err, "failed to configure primary judge; debates will use fallback verdicts");
            None
        }
    }
}

#[cfg(not(feature = "openai-judge"))]
fn build_primary_judge(_config: &AppConfig) -> Option<Arc<dyn Judge>> {
    None
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
