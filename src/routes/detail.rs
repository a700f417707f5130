//! Pipeline detail flow.

use crate::client::{ClientError, PipelineApi};
use crate::routes::{PipelineView, RouteParams};

pub const STATE: &str = "pipeline.detail";

/// Fetch the pipeline named by the current route state and shape its
/// statistic for the chart.
///
/// NotFound propagates; a partially built view is never exposed.
pub async fn load(
    api: &dyn PipelineApi,
    params: &RouteParams,
) -> Result<PipelineView, ClientError> {
    let pipeline = api.get(&params.pipeline_id).await?;
    Ok(PipelineView::from(pipeline))
}
