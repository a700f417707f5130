//! Public API surface for the pipeline service.
//!
//! This file consolidates the wire-level types shared by the HTTP server,
//! the resource client and the storage layer. All types derive
//! Serialize/Deserialize for JSON serialization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::routes::chart::{ChartPoint, ChartSeries, DATAPOINTS_KEY};
pub use crate::routes::{PipelineView, RouteParams, StatisticView};

/// Pipeline identifier (UUID v4, assigned at creation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PipelineId(pub String);

impl PipelineId {
    pub fn new(value: impl Into<String>) -> Self {
        PipelineId(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PipelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PipelineId {
    fn from(value: &str) -> Self {
        PipelineId(value.to_string())
    }
}

/// A named ingestion channel with its aggregated statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub statistic: PipelineStatistic,
    #[serde(default)]
    pub consumers: Vec<Consumer>,
}

/// Creation payload: exactly the three fields collected by the creation form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPipeline {
    pub name: String,
    pub description: String,
    pub active: bool,
}

/// A registered consumer group and how far it lags behind the head pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumer {
    pub id: String,
    pub unread_elements: i64,
}

/// Aggregated intake statistics attached to a pipeline.
///
/// `statistics` holds the raw daily samples as received from the storage
/// layer, newest first. The chart-ready representation lives on the view
/// side (`StatisticView::values`), never on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStatistic {
    pub today: i64,
    pub change_rate: f64,
    #[serde(default)]
    pub statistics: Vec<StatisticSample>,
}

/// One day's intake count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticSample {
    pub date: NaiveDate,
    pub intake: i64,
}

impl StatisticSample {
    pub fn new(date: NaiveDate, intake: i64) -> Self {
        Self { date, intake }
    }
}
