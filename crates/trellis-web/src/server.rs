//! Router assembly and the listener loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use trellis_client::StoreClient;
use trellis_query::{Introspection, Rewriter};

use crate::routes::{graphql_routes, health_routes};
use crate::WebError;

/// Process-wide state: built once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct AppState {
    pub rewriter: Rewriter,
    pub introspection: Introspection,
    pub client: StoreClient,
}

/// Permissive CORS so browser IDEs can talk to the facade directly.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(graphql_routes(state.clone()))
        .merge(health_routes(state))
        .layer(CorsLayer::permissive())
}

pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<(), WebError> {
    let app = router(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(WebError::Io)?;
    axum::serve(listener, app).await.map_err(WebError::Io)?;

    Ok(())
}
