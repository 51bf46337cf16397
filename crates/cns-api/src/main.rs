//! Content navigation service entry point.

use std::error::Error;
use std::sync::Arc;

use cns_api::config::AppConfig;
use cns_api::outbox::{self, BroadcastOutbox};
use cns_api::routes;
use cns_api::state::AppState;
use cns_api::telemetry;
use cns_core::clock::SystemClock;
use cns_session::application::command_handlers::NavigationEngine;
use cns_session::application::registry::SessionRegistry;
use cns_structure::application::loader::{FileStructureLoader, SingleNodeLoader, StructureLoader};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Read configuration from environment.
    let config = AppConfig::from_env()?;

    // Initialize tracing subscriber.
    let telemetry = telemetry::init(&config)?;

    tracing::info!("Starting content navigation service");

    let loader: Arc<dyn StructureLoader> = match &config.structure_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "loading structure definitions from directory");
            Arc::new(FileStructureLoader::new(dir))
        }
        None => {
            tracing::warn!("CNS_STRUCTURE_DIR not set, serving every process as a single node");
            Arc::new(SingleNodeLoader)
        }
    };

    // Outbound messages are logged until a real transport subscribes.
    let outbox = BroadcastOutbox::default();
    tokio::spawn(outbox::drain_to_log(outbox.subscribe()));

    // Build application state.
    let engine = NavigationEngine::new(
        Arc::new(SessionRegistry::new()),
        loader,
        Arc::new(outbox.clone()),
        Arc::new(outbox),
        Arc::new(SystemClock),
    )
    .with_policy(config.next_policy.policy())
    .with_load_timeout(config.load_timeout);
    let app_state = AppState::new(Arc::new(engine));

    // Build router.
    let app = routes::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
