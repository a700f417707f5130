//! Resource client for the pipeline REST API.
//!
//! [`PipelineApi`] is the seam the view flows depend on; [`HttpPipelineClient`]
//! is the reqwest-backed implementation speaking to a running server. Each
//! call is a single fire-and-forget HTTP round trip: no retries, no caching,
//! no timeouts. Errors surface to the caller untouched.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::{NewPipeline, Pipeline, PipelineId, PipelineStatistic};

/// Error taxonomy of the resource client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never completed (DNS, connect, transport, decode).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server has no pipeline under the requested identifier.
    #[error("pipeline {0} not found")]
    NotFound(PipelineId),

    /// The server rejected a create payload.
    #[error("pipeline rejected by server: {0}")]
    Validation(String),

    /// Any other non-success response.
    #[error("unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

/// Abstract pipeline API consumed by the view flows.
///
/// Implemented by [`HttpPipelineClient`] in production and by in-memory
/// mocks in tests.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Fetch all pipelines with their embedded statistics.
    async fn list(&self) -> Result<Vec<Pipeline>, ClientError>;

    /// Fetch one pipeline by identifier.
    async fn get(&self, id: &PipelineId) -> Result<Pipeline, ClientError>;

    /// Submit a new pipeline.
    async fn create(&self, pipeline: &NewPipeline) -> Result<(), ClientError>;

    /// Fetch the statistics resource for one pipeline.
    ///
    /// Exposed because the endpoint exists; the flows read statistics from
    /// the pipeline payload instead.
    async fn statistics(&self, id: &PipelineId) -> Result<PipelineStatistic, ClientError>;
}

/// HTTP implementation of [`PipelineApi`].
#[derive(Debug, Clone)]
pub struct HttpPipelineClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPipelineClient {
    /// Create a client against a server base URL such as `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Reuse an existing reqwest client (connection pool sharing).
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/pipelines{}", self.base_url, path)
    }

    async fn unexpected(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ClientError::UnexpectedStatus { status, body }
    }
}

#[async_trait]
impl PipelineApi for HttpPipelineClient {
    async fn list(&self) -> Result<Vec<Pipeline>, ClientError> {
        let response = self.http.get(self.endpoint("")).send().await?;
        if !response.status().is_success() {
            return Err(Self::unexpected(response).await);
        }
        Ok(response.json().await?)
    }

    async fn get(&self, id: &PipelineId) -> Result<Pipeline, ClientError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/{}", id)))
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(id.clone())),
            status if status.is_success() => Ok(response.json().await?),
            _ => Err(Self::unexpected(response).await),
        }
    }

    async fn create(&self, pipeline: &NewPipeline) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.endpoint(""))
            .json(pipeline)
            .send()
            .await?;
        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ClientError::Validation(
                    response.text().await.unwrap_or_default(),
                ))
            }
            status if status.is_success() => Ok(()),
            _ => Err(Self::unexpected(response).await),
        }
    }

    async fn statistics(&self, id: &PipelineId) -> Result<PipelineStatistic, ClientError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/{}/statistics", id)))
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(id.clone())),
            status if status.is_success() => Ok(response.json().await?),
            _ => Err(Self::unexpected(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_follow_the_collection_path() {
        let client = HttpPipelineClient::new("http://localhost:3000/");
        assert_eq!(
            client.endpoint(""),
            "http://localhost:3000/api/v1/pipelines"
        );
        assert_eq!(
            client.endpoint("/abc"),
            "http://localhost:3000/api/v1/pipelines/abc"
        );
        assert_eq!(
            client.endpoint("/abc/statistics"),
            "http://localhost:3000/api/v1/pipelines/abc/statistics"
        );
    }

    #[test]
    fn not_found_names_the_pipeline() {
        let err = ClientError::NotFound(PipelineId::new("p-42"));
        assert_eq!(err.to_string(), "pipeline p-42 not found");
    }
}
