//! Pipeline creation flow.

use serde::{Deserialize, Serialize};

use crate::api::NewPipeline;
use crate::client::{ClientError, PipelineApi};

pub const STATE: &str = "pipeline.new";

/// Bound form state of the creation view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineForm {
    pub name: String,
    pub description: String,
    pub active: bool,
}

impl PipelineForm {
    fn into_payload(self) -> NewPipeline {
        NewPipeline {
            name: self.name,
            description: self.description,
            active: self.active,
        }
    }
}

/// Submit the form as a new pipeline.
///
/// The payload carries exactly the three bound fields. No navigation
/// happens on success; the caller decides whether and how to surface a
/// failure.
pub async fn submit(api: &dyn PipelineApi, form: PipelineForm) -> Result<(), ClientError> {
    api.create(&form.into_payload()).await
}
