use std::{net::SocketAddr, sync::Arc};

use kunang::{
  common::{logger, types::AnyResult},
  configs::Config,
  server::AppState,
  sources::SourceManager,
  transport,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AnyResult<()> {
  let config = Config::load()?;
  logger::init(config.logging.as_ref());

  let address: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

  let source_manager = Arc::new(SourceManager::from_config(config).await);
  let names = source_manager.source_names();
  if names.is_empty() {
    warn!("No sources are active; every query will come back empty");
  } else {
    info!("Active sources: {}", names.join(", "));
  }

  let shared_state = Arc::new(AppState::new(source_manager));
  let app = transport::router(shared_state)
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http());

  info!("Kunang listening on {}", address);
  let listener = tokio::net::TcpListener::bind(address).await?;
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  info!("Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!("Failed to listen for shutdown signal: {}", e);
    std::future::pending::<()>().await;
  }
  info!("Shutdown signal received");
}
