use crate::aggregate;
use crate::client::{Snapshot, SnapshotRequest};
use crate::config::FeedsConfig;
use crate::types::{Job, JobFilter, Status};

use super::{Screen, ScreenUpdate};

/// Filterable catalog of jobs.
///
/// Filtering happens on the server; changing the filter and refreshing
/// re-fetches the list. The screen does not consume the live stream.
#[derive(Debug, Clone)]
pub struct JobsScreen {
    pub filter: JobFilter,
    pub jobs: Vec<Job>,
    /// Distinct agents in the current list, for the agent picker
    pub agent_options: Vec<String>,
}

impl JobsScreen {
    pub fn new(feeds: &FeedsConfig) -> Self {
        Self::with_filter(JobFilter::new(feeds.jobs_limit))
    }

    pub fn with_filter(filter: JobFilter) -> Self {
        Self {
            filter,
            jobs: Vec::new(),
            agent_options: Vec::new(),
        }
    }

    pub fn set_status(&mut self, status: Option<Status>) {
        self.filter.status = status;
    }

    pub fn set_agent(&mut self, agent: Option<String>) {
        self.filter.agent = agent.filter(|a| !a.is_empty());
    }
}

impl Screen for JobsScreen {
    fn requests(&self) -> Vec<SnapshotRequest> {
        vec![SnapshotRequest::Jobs(self.filter.clone())]
    }

    fn apply(&mut self, update: ScreenUpdate) {
        if let ScreenUpdate::Snapshot(Snapshot::Jobs(jobs)) = update {
            self.jobs = jobs;
            self.agent_options = aggregate::agent_options(&self.jobs);
        }
    }
}
