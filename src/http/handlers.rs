//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;

use super::dto::{
    HealthResponse, NewPipeline, Pipeline, PipelineStatistic, PopQuery, PushAcceptedResponse,
    UpdatePipelineRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::PipelineId;
use crate::db::services as db_services;
use crate::services::ingest::Datapoint;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verify the service is running and the backend is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let database = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database,
    }))
}

// =============================================================================
// Pipeline CRUD
// =============================================================================

/// GET /api/v1/pipelines
///
/// List all pipelines with their statistics embedded.
pub async fn list_pipelines(State(state): State<AppState>) -> HandlerResult<Vec<Pipeline>> {
    let pipelines = db_services::list_pipelines(state.repository.as_ref()).await?;
    Ok(Json(pipelines))
}

/// POST /api/v1/pipelines
///
/// Create a new pipeline from `{name, description, active}`.
pub async fn create_pipeline(
    State(state): State<AppState>,
    Json(request): Json<NewPipeline>,
) -> Result<(StatusCode, Json<Pipeline>), AppError> {
    let pipeline = db_services::create_pipeline(state.repository.as_ref(), &request).await?;
    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /api/v1/pipelines/{pipeline_id}
pub async fn get_pipeline(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
) -> HandlerResult<Pipeline> {
    let id = PipelineId::new(pipeline_id);
    let pipeline = db_services::get_pipeline(state.repository.as_ref(), &id).await?;
    Ok(Json(pipeline))
}

/// PUT /api/v1/pipelines/{pipeline_id}
pub async fn update_pipeline(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
    Json(request): Json<UpdatePipelineRequest>,
) -> HandlerResult<Pipeline> {
    let id = PipelineId::new(pipeline_id);
    let pipeline = db_services::update_pipeline(
        state.repository.as_ref(),
        &id,
        &request.name,
        &request.description,
    )
    .await?;
    Ok(Json(pipeline))
}

/// DELETE /api/v1/pipelines/{pipeline_id}
pub async fn delete_pipeline(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = PipelineId::new(pipeline_id);
    let deleted = db_services::delete_pipeline(state.repository.as_ref(), &id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("pipeline {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Statistics
// =============================================================================

/// GET /api/v1/pipelines/{pipeline_id}/statistics
pub async fn get_pipeline_statistics(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
) -> HandlerResult<PipelineStatistic> {
    let id = PipelineId::new(pipeline_id);
    let statistic = db_services::retrieve_statistics(state.repository.as_ref(), &id).await?;
    Ok(Json(statistic))
}

// =============================================================================
// Datapoints
// =============================================================================

/// POST /api/v1/pipelines/{pipeline_id}/datapoints
///
/// Queue a raw datapoint value for the writer pool. The body is taken
/// verbatim; application happens asynchronously.
pub async fn push_datapoint(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
    body: String,
) -> Result<(StatusCode, Json<PushAcceptedResponse>), AppError> {
    let id = PipelineId::new(pipeline_id);
    state
        .writer
        .enqueue(Datapoint {
            pipeline_id: id.clone(),
            value: body,
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PushAcceptedResponse {
            message: format!("Datapoint accepted for pipeline {}", id),
        }),
    ))
}

/// GET /api/v1/pipelines/{pipeline_id}/datapoints?consumer=X
///
/// Pop the next batch of datapoints for a consumer group.
pub async fn pop_datapoints(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
    Query(query): Query<PopQuery>,
) -> HandlerResult<Vec<String>> {
    let id = PipelineId::new(pipeline_id);
    let datapoints =
        db_services::pop_datapoints(state.repository.as_ref(), &id, &query.consumer).await?;
    Ok(Json(datapoints))
}

/// GET /api/v1/pipelines/{pipeline_id}/datapoints/stream
///
/// Stream datapoints as they are applied, via Server-Sent Events.
pub async fn stream_datapoints(
    State(state): State<AppState>,
    Path(pipeline_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let id = PipelineId::new(pipeline_id);
    // 404 before the stream starts rather than an empty feed.
    db_services::get_pipeline(state.repository.as_ref(), &id).await?;

    let mut rx = state.stream.subscribe(&id);
    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(value) => yield Ok(Event::default().data(value)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
