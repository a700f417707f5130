//! High-level business logic over the repository traits.
//!
//! Handlers and bindings go through these functions rather than the raw
//! repository: they assemble full `Pipeline` payloads (statistics and
//! consumer state embedded), assign identifiers and enforce payload
//! validation.

use chrono::Utc;
use log::{debug, info};
use uuid::Uuid;

use crate::api::{NewPipeline, Pipeline, PipelineId, PipelineStatistic};
use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};

/// Fetch all pipelines with their statistics embedded.
///
/// Consumer state is only assembled on the detail fetch, matching the
/// collection payload of the REST contract.
pub async fn list_pipelines(repo: &dyn FullRepository) -> RepositoryResult<Vec<Pipeline>> {
    let records = repo.list_pipelines().await?;
    let today = Utc::now().date_naive();

    let mut pipelines = Vec::with_capacity(records.len());
    for record in records {
        let statistic = repo.retrieve_statistics(&record.id, today).await?;
        pipelines.push(Pipeline {
            id: record.id,
            name: record.name,
            description: record.description,
            active: record.active,
            statistic,
            consumers: Vec::new(),
        });
    }
    debug!("listed {} pipelines", pipelines.len());
    Ok(pipelines)
}

/// Fetch one pipeline with statistics and consumer state embedded.
pub async fn get_pipeline(
    repo: &dyn FullRepository,
    id: &PipelineId,
) -> RepositoryResult<Pipeline> {
    let record = repo.get_pipeline(id).await?;
    let statistic = repo
        .retrieve_statistics(id, Utc::now().date_naive())
        .await?;
    let consumers = repo.list_consumers(id).await?;
    Ok(Pipeline {
        id: record.id,
        name: record.name,
        description: record.description,
        active: record.active,
        statistic,
        consumers,
    })
}

/// Store a new pipeline under a generated identifier.
pub async fn create_pipeline(
    repo: &dyn FullRepository,
    new: &NewPipeline,
) -> RepositoryResult<Pipeline> {
    if new.name.trim().is_empty() {
        return Err(RepositoryError::validation("pipeline name must not be empty"));
    }

    let record = crate::db::repository::PipelineRecord {
        id: PipelineId::new(Uuid::new_v4().to_string()),
        name: new.name.clone(),
        description: new.description.clone(),
        active: new.active,
    };
    repo.insert_pipeline(&record).await?;
    info!("created pipeline {} ({})", record.id, record.name);

    Ok(Pipeline {
        id: record.id,
        name: record.name,
        description: record.description,
        active: record.active,
        statistic: PipelineStatistic::default(),
        consumers: Vec::new(),
    })
}

/// Update name and description of a stored pipeline.
pub async fn update_pipeline(
    repo: &dyn FullRepository,
    id: &PipelineId,
    name: &str,
    description: &str,
) -> RepositoryResult<Pipeline> {
    let record = repo.update_pipeline(id, name, description).await?;
    Ok(Pipeline {
        id: record.id,
        name: record.name,
        description: record.description,
        active: record.active,
        statistic: PipelineStatistic::default(),
        consumers: Vec::new(),
    })
}

/// Delete a pipeline and its queue state.
pub async fn delete_pipeline(repo: &dyn FullRepository, id: &PipelineId) -> RepositoryResult<bool> {
    let deleted = repo.delete_pipeline(id).await?;
    if deleted {
        info!("deleted pipeline {}", id);
    }
    Ok(deleted)
}

/// Fetch the statistic block of a stored pipeline.
pub async fn retrieve_statistics(
    repo: &dyn FullRepository,
    id: &PipelineId,
) -> RepositoryResult<PipelineStatistic> {
    // The statistics resource 404s for unknown pipelines even though the
    // counters would read as all-zero.
    repo.get_pipeline(id).await?;
    repo.retrieve_statistics(id, Utc::now().date_naive()).await
}

/// Append a datapoint to a pipeline's queue.
///
/// # Returns
/// The index assigned to the datapoint.
pub async fn push_datapoint(
    repo: &dyn FullRepository,
    id: &PipelineId,
    value: &str,
) -> RepositoryResult<i64> {
    let index = repo
        .push_datapoint(id, value, Utc::now().date_naive())
        .await?;
    debug!("pushed datapoint {} to pipeline {}", index, id);
    Ok(index)
}

/// Pop the next batch of datapoints for a consumer.
pub async fn pop_datapoints(
    repo: &dyn FullRepository,
    id: &PipelineId,
    consumer_id: &str,
) -> RepositoryResult<Vec<String>> {
    repo.pop_datapoints(id, consumer_id).await
}

/// Verify the backend is reachable.
pub async fn health_check(repo: &dyn FullRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}
