//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, compression, tracing) and
//! returns the axum router ready for serving.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS for development; restrict in production.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Pipelines
        .route("/pipelines", get(handlers::list_pipelines))
        .route("/pipelines", post(handlers::create_pipeline))
        // Pipeline
        .route(
            "/pipelines/{pipeline_id}",
            get(handlers::get_pipeline)
                .put(handlers::update_pipeline)
                .delete(handlers::delete_pipeline),
        )
        // Pipeline statistics
        .route(
            "/pipelines/{pipeline_id}/statistics",
            get(handlers::get_pipeline_statistics),
        )
        // Datapoints
        .route(
            "/pipelines/{pipeline_id}/datapoints",
            get(handlers::pop_datapoints).post(handlers::push_datapoint),
        )
        .route(
            "/pipelines/{pipeline_id}/datapoints/stream",
            get(handlers::stream_datapoints),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::services::{DatapointWriter, StreamHub};
    use std::sync::Arc;

    #[tokio::test]
    async fn router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn crate::db::FullRepository>;
        let stream = StreamHub::new();
        let (writer, _pool) = DatapointWriter::spawn(repo.clone(), stream.clone(), 1);
        let _router = create_router(AppState::new(repo, writer, stream));
    }
}
