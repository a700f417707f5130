//! Data Transfer Objects for the HTTP API.
//!
//! The wire types already live in `api` and are re-exported here; this
//! module adds the request/response shapes specific to the REST surface.

use serde::{Deserialize, Serialize};

pub use crate::api::{Consumer, NewPipeline, Pipeline, PipelineStatistic, StatisticSample};

/// Request body for updating a pipeline. Only name and description are
/// mutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePipelineRequest {
    pub name: String,
    pub description: String,
}

/// Response for an accepted datapoint push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushAcceptedResponse {
    /// Message about the operation
    pub message: String,
}

/// Query parameters for popping datapoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopQuery {
    /// Consumer group identifier
    pub consumer: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Backend connectivity
    pub database: String,
}
