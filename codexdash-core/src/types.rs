//! Core domain types for codexdash
//!
//! These types mirror the JSON returned by the codexdash API and pushed over
//! the live event stream.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Agent** | A named autonomous worker (usually a tmux pane) |
//! | **Job** | One unit of work executed by an agent |
//! | **Event** | An immutable timestamped record correlated to an agent and/or job |
//! | **Sub-agent** | An ad hoc label for a delegated worker spawned within a job |
//!
//! References between records are soft: `Job::agent`, `Event::agent` and
//! `Event::job_id` name other records by value and may dangle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tokens::TokenCounts;

/// Key used for records that carry no agent name.
pub const UNKNOWN_AGENT: &str = "unknown";

// ============================================
// Status
// ============================================

/// Lifecycle status shared by agents, jobs and status events.
///
/// Any status string the client does not recognise decodes to [`Status::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Running,
    Done,
    Blocked,
    Error,
    Idle,
    #[serde(other)]
    Unknown,
}

impl Status {
    /// Returns the identifier used on the wire and in query parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Running => "running",
            Status::Done => "done",
            Status::Blocked => "blocked",
            Status::Error => "error",
            Status::Idle => "idle",
            Status::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Status::Running),
            "done" => Ok(Status::Done),
            "blocked" => Ok(Status::Blocked),
            "error" => Ok(Status::Error),
            "idle" => Ok(Status::Idle),
            "unknown" => Ok(Status::Unknown),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

// ============================================
// Agent
// ============================================

/// A named worker whose status and session metadata are tracked.
///
/// Agents are replaced wholesale on every snapshot; the live stream never
/// mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique, stable agent name
    pub agent: String,
    #[serde(default)]
    pub status: Option<Status>,
    /// Last activity (epoch millis)
    #[serde(default)]
    pub last_seen: Option<i64>,
    #[serde(default)]
    pub pane_id: Option<String>,
    #[serde(default)]
    pub window_name: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Agent {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            status: None,
            last_seen: None,
            pane_id: None,
            window_name: None,
            session: None,
            model: None,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Status for display: a missing status reads as `idle`.
    pub fn status_label(&self) -> &'static str {
        self.status.map(|s| s.as_str()).unwrap_or("idle")
    }
}

// ============================================
// Job
// ============================================

/// One unit of work executed by an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub started_ts: Option<i64>,
    #[serde(default)]
    pub updated_ts: Option<i64>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub prompt_text: Option<String>,
    #[serde(default)]
    pub prompt_hash: Option<String>,
    #[serde(default)]
    pub prompt_bytes: Option<i64>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub output_bytes: Option<i64>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(flatten)]
    pub tokens: TokenCounts,
}

impl Job {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Self::default()
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tokens(mut self, tokens: TokenCounts) -> Self {
        self.tokens = tokens;
        self
    }

    /// Agent key for aggregation: missing or empty names become `unknown`.
    pub fn agent_key(&self) -> &str {
        agent_key(self.agent.as_deref())
    }

    /// Status for display: a missing status reads as `unknown`.
    pub fn status_label(&self) -> &'static str {
        self.status.map(|s| s.as_str()).unwrap_or("unknown")
    }

    /// First eight characters of the job id.
    pub fn short_id(&self) -> &str {
        match self.job_id.char_indices().nth(8) {
            Some((idx, _)) => &self.job_id[..idx],
            None => &self.job_id,
        }
    }

    /// Prompt text, else its hash, else a placeholder.
    pub fn prompt_preview(&self) -> &str {
        self.prompt_text
            .as_deref()
            .or(self.prompt_hash.as_deref())
            .unwrap_or("(not captured)")
    }
}

// ============================================
// Event
// ============================================

/// An immutable timestamped record of something that happened.
///
/// `type` is the semantic kind, for example `dispatch`, `pane_output` or
/// `controller_output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Epoch millis. Stored rows may carry no timestamp.
    #[serde(default)]
    pub ts: Option<i64>,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    /// Server-side row id (snapshot pages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub pane_id: Option<String>,
    #[serde(default)]
    pub window_name: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub prompt_text: Option<String>,
    #[serde(default)]
    pub prompt_hash: Option<String>,
    #[serde(default)]
    pub prompt_bytes: Option<i64>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub output_bytes: Option<i64>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(flatten)]
    pub tokens: TokenCounts,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub sub_agent: Option<String>,
}

impl Event {
    pub fn new(ts: i64, event_type: impl Into<String>) -> Self {
        Self {
            ts: Some(ts),
            event_type: Some(event_type.into()),
            id: None,
            session: None,
            agent: None,
            pane_id: None,
            window_name: None,
            job_id: None,
            payload: None,
            text: None,
            prompt_text: None,
            prompt_hash: None,
            prompt_bytes: None,
            output_path: None,
            output_bytes: None,
            model: None,
            tokens: TokenCounts::default(),
            status: None,
            sub_agent: None,
        }
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_sub_agent(mut self, sub_agent: impl Into<String>) -> Self {
        self.sub_agent = Some(sub_agent.into());
        self
    }

    pub fn with_tokens(mut self, tokens: TokenCounts) -> Self {
        self.tokens = tokens;
        self
    }

    /// Agent key for grouping: missing or empty names become `unknown`.
    pub fn agent_key(&self) -> &str {
        agent_key(self.agent.as_deref())
    }

    /// Wall-clock time of the event, if `ts` is a valid epoch-millis value.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.ts.and_then(DateTime::from_timestamp_millis)
    }

    /// Semantic kind, or an empty string when the row has none.
    pub fn kind(&self) -> &str {
        self.event_type.as_deref().unwrap_or_default()
    }

    /// Both `ts` and a non-empty `type` are set.
    pub fn is_complete(&self) -> bool {
        self.ts.is_some() && !self.kind().is_empty()
    }

    /// One-line label: text, else prompt text, else job id, else `event`.
    pub fn summary(&self) -> &str {
        non_empty(self.text.as_deref())
            .or_else(|| non_empty(self.prompt_text.as_deref()))
            .or_else(|| non_empty(self.job_id.as_deref()))
            .unwrap_or("event")
    }
}

fn agent_key(agent: Option<&str>) -> &str {
    non_empty(agent).unwrap_or(UNKNOWN_AGENT)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

// ============================================
// Snapshot payloads
// ============================================

/// Response of `GET /api/jobs/{job_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    pub job: Job,
    /// Events for the job, in the order the server returned them (ascending ts)
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Pane health for one agent, as reported by `GET /api/doctor`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneDiagnostics {
    #[serde(default)]
    pub responsive: bool,
    #[serde(default)]
    pub pane_id: Option<String>,
    #[serde(default)]
    pub window_name: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub auth_needed: bool,
}

/// Diagnostics summary keyed by agent name
pub type Diagnostics = BTreeMap<String, PaneDiagnostics>;

/// Response of `GET /api/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub ok: bool,
    #[serde(default)]
    pub ts: Option<i64>,
}

// ============================================
// Filters
// ============================================

/// Server-side filter for the jobs list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    pub limit: usize,
    pub status: Option<Status>,
    pub agent: Option<String>,
}

impl JobFilter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            status: None,
            agent: None,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Query parameters, in the order they are sent. Unset filters are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(agent) = self.agent.as_deref().filter(|a| !a.is_empty()) {
            pairs.push(("agent", agent.to_string()));
        }
        pairs
    }
}

/// Filter for an events page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub limit: usize,
    /// Only events with `ts >= since` (epoch millis)
    pub since: Option<i64>,
}

impl EventFilter {
    pub fn new(limit: usize) -> Self {
        Self { limit, since: None }
    }

    pub fn since(mut self, ts: i64) -> Self {
        self.since = Some(ts);
        self
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if let Some(since) = self.since {
            pairs.push(("since", since.to_string()));
        }
        pairs
    }
}
