use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{consumers, datapoints, pipeline_intake, pipelines};
use crate::api::PipelineId;
use crate::db::repository::PipelineRecord;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pipelines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // created_at is carried for database operations only
pub struct PipelineRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PipelineRow> for PipelineRecord {
    fn from(row: PipelineRow) -> Self {
        PipelineRecord {
            id: PipelineId::new(row.id),
            name: row.name,
            description: row.description,
            active: row.active,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pipelines)]
pub struct NewPipelineRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub active: bool,
}

impl From<&PipelineRecord> for NewPipelineRow {
    fn from(record: &PipelineRecord) -> Self {
        NewPipelineRow {
            id: record.id.value().to_string(),
            name: record.name.clone(),
            description: record.description.clone(),
            active: record.active,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pipeline_intake)]
pub struct NewIntakeRow {
    pub pipeline_id: String,
    pub day: NaiveDate,
    pub intake: i64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = datapoints)]
pub struct NewDatapointRow {
    pub pipeline_id: String,
    pub idx: i64,
    pub value: String,
}

#[derive(Debug, Clone, Queryable)]
pub struct ConsumerRow {
    pub consumer_id: String,
    pub pointer: i64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = consumers)]
pub struct NewConsumerRow {
    pub pipeline_id: String,
    pub consumer_id: String,
    pub pointer: i64,
}
