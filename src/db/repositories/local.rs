//! In-memory local repository implementation.
//!
//! Stores everything in HashMaps behind a single `RwLock`, giving unit
//! tests and local development a fast, deterministic, isolated backend.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::api::{Consumer, PipelineId, PipelineStatistic};
use crate::db::repository::{
    assemble_statistic, DatapointRepository, PipelineRecord, PipelineRepository, RepositoryError,
    RepositoryResult, DATAPOINT_BATCH_SIZE,
};

/// In-memory repository, the default backend.
///
/// # Example
/// ```
/// use turbined::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.pipeline_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

/// Queue state of one pipeline: the stored values by index, the head
/// pointer, the first retained index and the per-consumer read pointers.
#[derive(Default)]
struct QueueState {
    datapoints: BTreeMap<i64, String>,
    head: i64,
    first: i64,
    consumers: BTreeMap<String, i64>,
}

struct LocalData {
    pipelines: HashMap<PipelineId, PipelineRecord>,
    intake: HashMap<PipelineId, HashMap<NaiveDate, i64>>,
    queues: HashMap<PipelineId, QueueState>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            pipelines: HashMap::new(),
            intake: HashMap::new(),
            queues: HashMap::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the health flag to exercise connection-failure paths in tests.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().unwrap().is_healthy = healthy;
    }

    /// Drop all stored data, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write().unwrap();
        let is_healthy = data.is_healthy;
        *data = LocalData {
            is_healthy,
            ..Default::default()
        };
    }

    /// Number of stored pipelines.
    pub fn pipeline_count(&self) -> usize {
        self.data.read().unwrap().pipelines.len()
    }

    /// Whether a pipeline is stored.
    pub fn has_pipeline(&self, id: &PipelineId) -> bool {
        self.data.read().unwrap().pipelines.contains_key(id)
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().unwrap().is_healthy {
            return Err(RepositoryError::connection("backend is not healthy"));
        }
        Ok(())
    }
}

#[async_trait]
impl PipelineRepository for LocalRepository {
    async fn list_pipelines(&self) -> RepositoryResult<Vec<PipelineRecord>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let mut records: Vec<PipelineRecord> = data.pipelines.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn get_pipeline(&self, id: &PipelineId) -> RepositoryResult<PipelineRecord> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        data.pipelines.get(id).cloned().ok_or_else(|| {
            RepositoryError::not_found(format!("pipeline {} not found", id))
        })
    }

    async fn insert_pipeline(&self, record: &PipelineRecord) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        data.pipelines.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update_pipeline(
        &self,
        id: &PipelineId,
        name: &str,
        description: &str,
    ) -> RepositoryResult<PipelineRecord> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        let record = data.pipelines.get_mut(id).ok_or_else(|| {
            RepositoryError::not_found(format!("pipeline {} not found", id))
        })?;
        record.name = name.to_string();
        record.description = description.to_string();
        Ok(record.clone())
    }

    async fn delete_pipeline(&self, id: &PipelineId) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        let existed = data.pipelines.remove(id).is_some();
        data.intake.remove(id);
        data.queues.remove(id);
        Ok(existed)
    }

    async fn retrieve_statistics(
        &self,
        id: &PipelineId,
        today: NaiveDate,
    ) -> RepositoryResult<PipelineStatistic> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let counters = data.intake.get(id);
        Ok(assemble_statistic(today, |date| {
            counters
                .and_then(|days| days.get(&date))
                .copied()
                .unwrap_or(0)
        }))
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().unwrap().is_healthy)
    }
}

#[async_trait]
impl DatapointRepository for LocalRepository {
    async fn push_datapoint(
        &self,
        id: &PipelineId,
        value: &str,
        day: NaiveDate,
    ) -> RepositoryResult<i64> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();

        // Unknown pipelines are created on the fly, as the original backend
        // does for dynamically addressed queues.
        if !data.pipelines.contains_key(id) {
            data.pipelines.insert(
                id.clone(),
                PipelineRecord {
                    id: id.clone(),
                    name: id.value().to_string(),
                    description: "Dynamically generated pipeline".to_string(),
                    active: true,
                },
            );
        }

        let queue = data.queues.entry(id.clone()).or_default();
        queue.head += 1;
        let index = queue.head;
        queue.datapoints.insert(index, value.to_string());

        *data
            .intake
            .entry(id.clone())
            .or_default()
            .entry(day)
            .or_insert(0) += 1;

        Ok(index)
    }

    async fn pop_datapoints(
        &self,
        id: &PipelineId,
        consumer_id: &str,
    ) -> RepositoryResult<Vec<String>> {
        self.check_health()?;
        let mut data = self.data.write().unwrap();
        let queue = data.queues.entry(id.clone()).or_default();

        let first = queue.first;
        let pointer = *queue
            .consumers
            .entry(consumer_id.to_string())
            .or_insert(first);

        let readable = queue.head - pointer;
        if readable <= 0 {
            return Ok(Vec::new());
        }

        let taken = readable.min(DATAPOINT_BATCH_SIZE as i64);
        let values = (pointer + 1..=pointer + taken)
            .filter_map(|index| queue.datapoints.get(&index).cloned())
            .collect();
        queue.consumers.insert(consumer_id.to_string(), pointer + taken);

        Ok(values)
    }

    async fn list_consumers(&self, id: &PipelineId) -> RepositoryResult<Vec<Consumer>> {
        self.check_health()?;
        let data = self.data.read().unwrap();
        let Some(queue) = data.queues.get(id) else {
            return Ok(Vec::new());
        };
        Ok(queue
            .consumers
            .iter()
            .map(|(consumer_id, pointer)| Consumer {
                id: consumer_id.clone(),
                unread_elements: queue.head - pointer,
            })
            .collect())
    }
}
