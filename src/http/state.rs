//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::{DatapointWriter, StreamHub};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for storage operations
    pub repository: Arc<dyn FullRepository>,
    /// Sending half of the datapoint ingest channel
    pub writer: DatapointWriter,
    /// Broadcast hub feeding the live datapoint stream
    pub stream: StreamHub,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        repository: Arc<dyn FullRepository>,
        writer: DatapointWriter,
        stream: StreamHub,
    ) -> Self {
        Self {
            repository,
            writer,
            stream,
        }
    }
}
