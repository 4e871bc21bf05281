use std::collections::BTreeMap;

use crate::aggregate;
use crate::client::{Snapshot, SnapshotRequest};
use crate::config::FeedsConfig;
use crate::store::EventStore;
use crate::types::{Agent, Diagnostics, Event, EventFilter};

use super::{Screen, ScreenUpdate};

/// Per-agent activity feeds plus pane diagnostics.
#[derive(Debug, Clone)]
pub struct AgentsScreen {
    pub agents: Vec<Agent>,
    pub events: EventStore,
    pub diagnostics: Diagnostics,
    /// Event counts per agent key, recomputed after every change
    pub event_counts: BTreeMap<String, usize>,
    feed_limit: usize,
}

impl AgentsScreen {
    pub fn new(feeds: &FeedsConfig) -> Self {
        Self {
            agents: Vec::new(),
            events: EventStore::new(feeds.agents_capacity),
            diagnostics: Diagnostics::new(),
            event_counts: BTreeMap::new(),
            feed_limit: feeds.agent_feed_limit,
        }
    }

    /// Events grouped by agent, most recent first within each group.
    pub fn groups(&self) -> BTreeMap<String, Vec<&Event>> {
        aggregate::group_by_agent(&self.events)
    }

    /// Most recent events for one agent, at most the configured feed limit.
    pub fn agent_feed(&self, agent: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.agent_key() == agent)
            .take(self.feed_limit)
            .collect()
    }

    fn recompute(&mut self) {
        let counts = self
            .groups()
            .into_iter()
            .map(|(agent, events)| (agent, events.len()))
            .collect();
        self.event_counts = counts;
    }
}

impl Screen for AgentsScreen {
    fn requests(&self) -> Vec<SnapshotRequest> {
        vec![
            SnapshotRequest::Agents,
            SnapshotRequest::Events(EventFilter::new(self.events.capacity())),
            SnapshotRequest::Diagnostics,
        ]
    }

    fn apply(&mut self, update: ScreenUpdate) {
        match update {
            ScreenUpdate::Snapshot(Snapshot::Agents(agents)) => self.agents = agents,
            ScreenUpdate::Snapshot(Snapshot::Diagnostics(diagnostics)) => {
                self.diagnostics = diagnostics
            }
            ScreenUpdate::Snapshot(Snapshot::Events(events)) => {
                self.events.replace_snapshot(events);
                self.recompute();
            }
            ScreenUpdate::Live(event) => {
                self.events.merge_live(event);
                self.recompute();
            }
            ScreenUpdate::Snapshot(_) => {}
        }
    }

    fn wants_live(&self) -> bool {
        true
    }
}
