//! Repository trait definitions.
//!
//! The storage backend is swappable behind these traits, mirroring the
//! original backend interface: pipeline CRUD plus statistics on one side,
//! the datapoint queue on the other. Implementations must be `Send + Sync`
//! to be shared across handler tasks.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::{Consumer, PipelineId, PipelineStatistic};

mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// How many datapoints a single pop hands to a consumer.
pub const DATAPOINT_BATCH_SIZE: usize = 10;

/// How many daily samples a statistics retrieval reports.
pub const STATISTICS_WINDOW_DAYS: i64 = 10;

/// A pipeline as the storage layer knows it: no embedded statistics or
/// consumers, those are assembled by the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRecord {
    pub id: PipelineId,
    pub name: String,
    pub description: String,
    pub active: bool,
}

/// Repository trait for pipeline storage and statistics.
#[async_trait]
pub trait PipelineRepository: Send + Sync {
    /// Fetch all stored pipelines.
    async fn list_pipelines(&self) -> RepositoryResult<Vec<PipelineRecord>>;

    /// Fetch one pipeline.
    ///
    /// # Returns
    /// * `Ok(PipelineRecord)` if stored
    /// * `Err(RepositoryError::NotFound)` otherwise
    async fn get_pipeline(&self, id: &PipelineId) -> RepositoryResult<PipelineRecord>;

    /// Store a new pipeline record under its id.
    async fn insert_pipeline(&self, record: &PipelineRecord) -> RepositoryResult<()>;

    /// Update name and description of a stored pipeline; other fields are
    /// immutable after creation.
    async fn update_pipeline(
        &self,
        id: &PipelineId,
        name: &str,
        description: &str,
    ) -> RepositoryResult<PipelineRecord>;

    /// Delete a pipeline and its queue state.
    ///
    /// # Returns
    /// * `Ok(true)` if a record was removed, `Ok(false)` if nothing was stored
    async fn delete_pipeline(&self, id: &PipelineId) -> RepositoryResult<bool>;

    /// Aggregate the intake counters into a statistic block: today's count,
    /// the change rate against yesterday, and the last
    /// [`STATISTICS_WINDOW_DAYS`] daily samples newest first with missing
    /// days reported as zero.
    async fn retrieve_statistics(
        &self,
        id: &PipelineId,
        today: NaiveDate,
    ) -> RepositoryResult<PipelineStatistic>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}

/// Repository trait for the datapoint queue.
#[async_trait]
pub trait DatapointRepository: Send + Sync {
    /// Append a datapoint: assign the next index, store the value and bump
    /// the day's intake counter. An unknown pipeline is created implicitly.
    ///
    /// # Returns
    /// The index assigned to the datapoint.
    async fn push_datapoint(
        &self,
        id: &PipelineId,
        value: &str,
        day: NaiveDate,
    ) -> RepositoryResult<i64>;

    /// Read up to [`DATAPOINT_BATCH_SIZE`] datapoints past the consumer's
    /// pointer and advance it. First pop registers the consumer.
    async fn pop_datapoints(
        &self,
        id: &PipelineId,
        consumer_id: &str,
    ) -> RepositoryResult<Vec<String>>;

    /// List registered consumers with their unread-element counts.
    async fn list_consumers(&self, id: &PipelineId) -> RepositoryResult<Vec<Consumer>>;
}

/// Combined repository interface the application is wired against.
pub trait FullRepository: PipelineRepository + DatapointRepository {}

impl<T: PipelineRepository + DatapointRepository> FullRepository for T {}

/// Shape per-day intake counts into a statistic block.
///
/// Shared by the backends so the window, ordering and change-rate rules
/// stay identical: samples cover the last [`STATISTICS_WINDOW_DAYS`] days
/// newest first, and the change rate compares today against yesterday
/// (0.0 when yesterday had no intake).
pub fn assemble_statistic(
    today: NaiveDate,
    intake_for: impl Fn(NaiveDate) -> i64,
) -> crate::api::PipelineStatistic {
    let today_count = intake_for(today);
    let yesterday_count = intake_for(today - chrono::Days::new(1));

    let change_rate = if yesterday_count != 0 {
        ((today_count - yesterday_count) as f64 / yesterday_count as f64) * 100.0
    } else {
        0.0
    };

    let statistics = (0..STATISTICS_WINDOW_DAYS)
        .map(|offset| {
            let date = today - chrono::Days::new(offset as u64);
            crate::api::StatisticSample::new(date, intake_for(date))
        })
        .collect();

    crate::api::PipelineStatistic {
        today: today_count,
        change_rate,
        statistics,
    }
}
