//! REST snapshot reads
//!
//! Every read issues exactly one request. The infallible `fetch_*` methods log
//! failures and resolve to empty collections; the `try_*` variants surface the
//! underlying [`Error`].

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::types::{Agent, Diagnostics, Event, EventFilter, Health, Job, JobDetail, JobFilter};

/// Outcome of a job detail read.
///
/// Distinct from "still loading": a screen that receives one of these has a
/// definite answer.
#[derive(Debug, Clone, PartialEq)]
pub enum JobDetailOutcome {
    Found(JobDetail),
    /// The server has no job with that id (HTTP 404 or `"job": null`)
    NotFound,
    /// The read failed; carries a human-readable reason
    Failed(String),
}

/// One snapshot read a screen can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRequest {
    Agents,
    Jobs(JobFilter),
    JobDetail(String),
    Events(EventFilter),
    Diagnostics,
}

/// Result of executing a [`SnapshotRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Agents(Vec<Agent>),
    Jobs(Vec<Job>),
    JobDetail(JobDetailOutcome),
    Events(Vec<Event>),
    Diagnostics(Diagnostics),
}

/// Wire shape of `GET /api/jobs/{job_id}`; `job` is null for unknown ids.
#[derive(Debug, Deserialize)]
struct RawJobDetail {
    #[serde(default)]
    job: Option<Job>,
    #[serde(default)]
    events: Vec<Event>,
}

/// Wire shape of `GET /api/doctor`
#[derive(Debug, Deserialize)]
struct DoctorResponse {
    #[serde(default)]
    agents: Diagnostics,
}

/// HTTP client for point-in-time reads
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SnapshotClient {
    /// Create a snapshot client for the configured server
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let (http_client, base_url) = super::http_client(config)?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Base URL requests are issued against (no trailing slash)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/agents`, empty on failure
    pub async fn fetch_agents(&self) -> Vec<Agent> {
        or_empty("agents", self.try_fetch_agents().await)
    }

    /// `GET /api/jobs` with the filter's parameters, empty on failure
    ///
    /// The server applies the filter; the result is returned as-is.
    pub async fn fetch_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        or_empty("jobs", self.try_fetch_jobs(filter).await)
    }

    /// `GET /api/events`, most-recent-first, empty on failure
    pub async fn fetch_events(&self, filter: &EventFilter) -> Vec<Event> {
        or_empty("events", self.try_fetch_events(filter).await)
    }

    /// `GET /api/doctor`, empty on failure
    pub async fn fetch_diagnostics(&self) -> Diagnostics {
        or_empty("diagnostics", self.try_fetch_diagnostics().await)
    }

    /// `GET /api/jobs/{job_id}`
    pub async fn fetch_job_detail(&self, job_id: &str) -> JobDetailOutcome {
        match self.try_fetch_job_detail(job_id).await {
            Ok(detail) => JobDetailOutcome::Found(detail),
            Err(Error::JobNotFound(_)) => JobDetailOutcome::NotFound,
            Err(Error::Status { status: 404, .. }) => JobDetailOutcome::NotFound,
            Err(e) => {
                tracing::warn!(job_id, error = %e, "Job detail fetch failed");
                JobDetailOutcome::Failed(e.to_string())
            }
        }
    }

    /// `GET /api/health`, `None` when the server is unreachable or unhealthy
    pub async fn health(&self) -> Option<Health> {
        match self.try_health().await {
            Ok(health) => Some(health),
            Err(e) => {
                tracing::warn!(error = %e, "Health check failed");
                None
            }
        }
    }

    /// Run one snapshot request
    pub async fn execute(&self, request: SnapshotRequest) -> Snapshot {
        match request {
            SnapshotRequest::Agents => Snapshot::Agents(self.fetch_agents().await),
            SnapshotRequest::Jobs(filter) => Snapshot::Jobs(self.fetch_jobs(&filter).await),
            SnapshotRequest::JobDetail(job_id) => {
                Snapshot::JobDetail(self.fetch_job_detail(&job_id).await)
            }
            SnapshotRequest::Events(filter) => Snapshot::Events(self.fetch_events(&filter).await),
            SnapshotRequest::Diagnostics => Snapshot::Diagnostics(self.fetch_diagnostics().await),
        }
    }

    pub async fn try_fetch_agents(&self) -> Result<Vec<Agent>> {
        self.get_json("/api/agents", &[]).await
    }

    pub async fn try_fetch_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        self.get_json("/api/jobs", &filter.query_pairs()).await
    }

    pub async fn try_fetch_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        self.get_json("/api/events", &filter.query_pairs()).await
    }

    pub async fn try_fetch_diagnostics(&self) -> Result<Diagnostics> {
        let response: DoctorResponse = self.get_json("/api/doctor", &[]).await?;
        Ok(response.agents)
    }

    /// Fetch a job and its events; unknown ids yield [`Error::JobNotFound`]
    pub async fn try_fetch_job_detail(&self, job_id: &str) -> Result<JobDetail> {
        let path = format!("/api/jobs/{}", urlencoding::encode(job_id));
        let raw: RawJobDetail = match self.get_json(&path, &[]).await {
            Err(Error::Status { status: 404, .. }) => {
                return Err(Error::JobNotFound(job_id.to_string()))
            }
            other => other?,
        };
        match raw.job {
            Some(job) => Ok(JobDetail {
                job,
                events: raw.events,
            }),
            None => Err(Error::JobNotFound(job_id.to_string())),
        }
    }

    pub async fn try_health(&self) -> Result<Health> {
        self.get_json("/api/health", &[]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, ?query, "Snapshot request");

        let response = self.http_client.get(&url).query(query).send().await?;
        if !response.status().is_success() {
            return Err(super::status_error(response).await);
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn or_empty<T: Default>(what: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(snapshot = what, error = %e, "Snapshot fetch failed, using empty result");
        T::default()
    })
}
