//! Derived views over agents, jobs and events.
//!
//! Everything here is a pure function of its inputs. Screens call these after
//! each change to their collections; nothing is cached between calls.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::types::{Event, Job};

/// Default number of recent events considered by [`token_series`].
pub const SERIES_WINDOW: usize = 40;

/// Prompt and completion tokens accumulated for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentTokens {
    pub agent: String,
    pub prompt: i64,
    pub completion: i64,
}

impl AgentTokens {
    pub fn total(&self) -> i64 {
        self.prompt + self.completion
    }
}

/// One point of the token time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenPoint {
    /// Epoch millis
    pub ts: i64,
    pub tokens: i64,
}

/// Partition events by agent name.
///
/// Missing or empty agent names are grouped under `"unknown"`. Each group
/// keeps the input order, so a most-recent-first feed stays most-recent-first.
pub fn group_by_agent<'a, I>(events: I) -> BTreeMap<String, Vec<&'a Event>>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut groups: BTreeMap<String, Vec<&'a Event>> = BTreeMap::new();
    for event in events {
        groups
            .entry(event.agent_key().to_string())
            .or_default()
            .push(event);
    }
    groups
}

/// Sum resolved prompt and completion tokens per job agent.
///
/// Jobs without an agent count towards `"unknown"`. One entry per distinct
/// agent, ordered by agent name.
pub fn tokens_by_agent(jobs: &[Job]) -> Vec<AgentTokens> {
    let mut totals: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for job in jobs {
        let entry = totals.entry(job.agent_key()).or_insert((0, 0));
        entry.0 += job.tokens.prompt();
        entry.1 += job.tokens.completion();
    }
    totals
        .into_iter()
        .map(|(agent, (prompt, completion))| AgentTokens {
            agent: agent.to_string(),
            prompt,
            completion,
        })
        .collect()
}

/// Token totals of the most recent events, oldest first.
///
/// Takes the first `window` events of a most-recent-first feed, keeps those
/// with both a timestamp and a non-empty type, and reverses the result
/// into chronological order.
pub fn token_series<'a, I>(events: I, window: usize) -> Vec<TokenPoint>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut points: Vec<TokenPoint> = events
        .into_iter()
        .take(window)
        .filter_map(|e| match (e.ts, e.kind()) {
            (Some(ts), kind) if !kind.is_empty() => Some(TokenPoint {
                ts,
                tokens: e.tokens.total(),
            }),
            _ => None,
        })
        .collect();
    points.reverse();
    points
}

/// Rebuild a job transcript from its events.
///
/// Joins the non-empty `text` of each event with newlines, in the order the
/// events were supplied.
pub fn transcript(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| e.text.as_deref())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Distinct sub-agent labels in first-occurrence order.
pub fn sub_agents(events: &[Event]) -> Vec<String> {
    distinct(events.iter().filter_map(|e| e.sub_agent.as_deref()))
}

/// Distinct agent names across jobs, in first-seen order.
///
/// Feeds the agent picker of the jobs list; jobs without an agent are skipped.
pub fn agent_options(jobs: &[Job]) -> Vec<String> {
    distinct(jobs.iter().filter_map(|j| j.agent.as_deref()))
}

/// File name used when saving a job transcript.
pub fn transcript_file_name(job_id: &str) -> String {
    format!("{}-transcript.txt", job_id)
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
