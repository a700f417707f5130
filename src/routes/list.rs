//! Pipeline list flow.

use crate::client::{ClientError, PipelineApi};
use crate::routes::PipelineView;

pub const STATE: &str = "pipeline.list";

/// Fetch all pipelines and shape each embedded statistic for the chart.
///
/// Errors propagate untouched; no partial list is exposed.
pub async fn load(api: &dyn PipelineApi) -> Result<Vec<PipelineView>, ClientError> {
    let pipelines = api.list().await?;
    Ok(pipelines.into_iter().map(PipelineView::from).collect())
}
