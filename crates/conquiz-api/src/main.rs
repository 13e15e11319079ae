//! Conquiz API server entry point.

use std::error::Error;
use std::sync::Arc;

use conquiz_api::config::Config;
use conquiz_api::routes;
use conquiz_api::state::AppState;
use conquiz_core::clock::SystemClock;
use conquiz_core::rng::SystemRng;
use conquiz_store::{HttpTriviaClient, StaticTriviaCatalog};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Conquiz API server");

    // Read configuration from environment.
    let config = Config::from_env()?;

    // Build application state.
    let clock = Arc::new(SystemClock);
    let app_state = if let Some(url) = &config.questions_url {
        tracing::info!(questions_url = %url, "using remote trivia service");
        AppState::in_memory(
            config.settings.clone(),
            Arc::new(HttpTriviaClient::new(url.clone(), Box::new(SystemRng))),
            clock,
        )
    } else {
        tracing::info!("using built-in trivia catalog");
        AppState::in_memory(
            config.settings.clone(),
            Arc::new(StaticTriviaCatalog::sample(Box::new(SystemRng))?),
            clock,
        )
    };

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr = config.addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
