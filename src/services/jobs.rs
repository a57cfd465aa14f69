//! Create-then-poll client for the backend's long-running ingestion jobs.
//!
//! The same shape recurs wherever the backend lacks a push channel: create a
//! job, poll by id on a fixed interval, stop on a terminal status or caller
//! cancellation. This is the single reusable form of that pattern.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::ServiceError;

pub const POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct JobEnvelope {
    success: bool,
    job: Option<Job>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    url: &'a str,
}

#[derive(Clone)]
pub struct JobsClient {
    client: Client,
    endpoint: String,
}

impl JobsClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint("jobs"),
        }
    }

    /// Create an ingestion job for a source url. Returns immediately with the
    /// queued job; progress arrives through polling.
    pub async fn create(&self, source_url: &str) -> Result<Job, ServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CreateRequest { url: source_url })
            .send()
            .await?;
        Self::into_job(response).await
    }

    pub async fn fetch(&self, id: &str) -> Result<Job, ServiceError> {
        let response = self
            .client
            .get(format!("{}/{}", self.endpoint, id))
            .send()
            .await?;
        Self::into_job(response).await
    }

    /// Poll every `POLL_INTERVAL_MS` until the job reaches a terminal status.
    /// The token guarantees interval teardown when the caller goes away.
    pub async fn wait(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Job, ServiceError> {
        let mut cadence = tokio::time::interval(Duration::from_millis(POLL_INTERVAL_MS));
        cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("job {} poll cancelled", id);
                    return Err(ServiceError::Backend("polling cancelled".to_string()));
                }
                _ = cadence.tick() => {
                    let job = self.fetch(id).await?;
                    if job.status.is_terminal() {
                        return Ok(job);
                    }
                    debug!(
                        "job {} status {:?} progress {:?}",
                        id, job.status, job.progress
                    );
                }
            }
        }
    }

    async fn into_job(response: reqwest::Response) -> Result<Job, ServiceError> {
        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status()));
        }
        let body: JobEnvelope = response.json().await?;
        match (body.success, body.job) {
            (true, Some(job)) => Ok(job),
            _ => Err(ServiceError::Backend(
                body.message.unwrap_or_else(|| "job request failed".to_string()),
            )),
        }
    }
}
