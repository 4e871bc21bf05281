use std::path::{Path, PathBuf};

use crate::aggregate;
use crate::client::{JobDetailOutcome, Snapshot, SnapshotRequest};
use crate::error::{Error, Result};
use crate::types::{Event, Job};

use super::{Screen, ScreenUpdate};

/// Where a job detail read stands.
#[derive(Debug, Clone, PartialEq)]
pub enum JobDetailState {
    Loading,
    Loaded {
        job: Job,
        events: Vec<Event>,
        transcript: String,
        sub_agents: Vec<String>,
    },
    NotFound,
    Failed(String),
}

/// One job with its events, transcript and sub-agents.
#[derive(Debug, Clone)]
pub struct JobDetailScreen {
    job_id: String,
    pub state: JobDetailState,
}

impl JobDetailScreen {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            state: JobDetailState::Loading,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, JobDetailState::Loading)
    }

    /// Write the transcript to `{dir}/{job_id}-transcript.txt`
    pub fn save_transcript(&self, dir: &Path) -> Result<PathBuf> {
        let transcript = match &self.state {
            JobDetailState::Loaded { transcript, .. } => transcript,
            _ => return Err(Error::JobNotFound(self.job_id.clone())),
        };

        std::fs::create_dir_all(dir)?;
        let path = dir.join(aggregate::transcript_file_name(&self.job_id));
        std::fs::write(&path, transcript)?;
        tracing::info!(job_id = %self.job_id, path = %path.display(), "Saved transcript");
        Ok(path)
    }
}

impl Screen for JobDetailScreen {
    fn requests(&self) -> Vec<SnapshotRequest> {
        vec![SnapshotRequest::JobDetail(self.job_id.clone())]
    }

    fn apply(&mut self, update: ScreenUpdate) {
        let outcome = match update {
            ScreenUpdate::Snapshot(Snapshot::JobDetail(outcome)) => outcome,
            _ => return,
        };

        self.state = match outcome {
            JobDetailOutcome::Found(detail) => JobDetailState::Loaded {
                transcript: aggregate::transcript(&detail.events),
                sub_agents: aggregate::sub_agents(&detail.events),
                job: detail.job,
                events: detail.events,
            },
            JobDetailOutcome::NotFound => JobDetailState::NotFound,
            JobDetailOutcome::Failed(reason) => JobDetailState::Failed(reason),
        };
    }
}
