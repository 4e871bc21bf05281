use crate::aggregate::{self, AgentTokens, TokenPoint};
use crate::client::{Snapshot, SnapshotRequest};
use crate::config::FeedsConfig;
use crate::store::EventStore;
use crate::types::{Agent, EventFilter, Job, JobFilter};

use super::{Screen, ScreenUpdate};

/// Fleet overview: agent cards, controller timeline and token charts.
#[derive(Debug, Clone)]
pub struct DashboardScreen {
    pub agents: Vec<Agent>,
    pub jobs: Vec<Job>,
    /// Every live event received while the screen is open
    pub live: EventStore,
    /// Snapshot page plus live events, shown as the timeline
    pub timeline: EventStore,
    pub tokens_by_agent: Vec<AgentTokens>,
    pub token_series: Vec<TokenPoint>,
    jobs_limit: usize,
    events_limit: usize,
    series_window: usize,
}

impl DashboardScreen {
    pub fn new(feeds: &FeedsConfig) -> Self {
        Self {
            agents: Vec::new(),
            jobs: Vec::new(),
            live: EventStore::new(feeds.live_capacity),
            timeline: EventStore::new(feeds.dashboard_capacity),
            tokens_by_agent: Vec::new(),
            token_series: Vec::new(),
            jobs_limit: feeds.dashboard_jobs_limit,
            events_limit: feeds.dashboard_events_limit,
            series_window: feeds.series_window,
        }
    }

    fn recompute_jobs(&mut self) {
        self.tokens_by_agent = aggregate::tokens_by_agent(&self.jobs);
    }

    fn recompute_series(&mut self) {
        self.token_series = aggregate::token_series(&self.timeline, self.series_window);
    }
}

impl Screen for DashboardScreen {
    fn requests(&self) -> Vec<SnapshotRequest> {
        vec![
            SnapshotRequest::Agents,
            SnapshotRequest::Jobs(JobFilter::new(self.jobs_limit)),
            SnapshotRequest::Events(EventFilter::new(self.events_limit)),
        ]
    }

    fn apply(&mut self, update: ScreenUpdate) {
        match update {
            ScreenUpdate::Snapshot(Snapshot::Agents(agents)) => self.agents = agents,
            ScreenUpdate::Snapshot(Snapshot::Jobs(jobs)) => {
                self.jobs = jobs;
                self.recompute_jobs();
            }
            ScreenUpdate::Snapshot(Snapshot::Events(events)) => {
                self.timeline.replace_snapshot(events);
                self.recompute_series();
            }
            ScreenUpdate::Live(event) => {
                self.live.merge_live(event.clone());
                self.timeline.merge_live(event);
                self.recompute_series();
            }
            ScreenUpdate::Snapshot(_) => {}
        }
    }

    fn wants_live(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenCounts;
    use crate::types::Event;

    fn small_feeds() -> FeedsConfig {
        FeedsConfig {
            live_capacity: 5,
            dashboard_capacity: 3,
            ..FeedsConfig::default()
        }
    }

    #[test]
    fn requests_use_configured_limits() {
        let screen = DashboardScreen::new(&FeedsConfig::default());
        assert_eq!(
            screen.requests(),
            vec![
                SnapshotRequest::Agents,
                SnapshotRequest::Jobs(JobFilter::new(20)),
                SnapshotRequest::Events(EventFilter::new(30)),
            ]
        );
        assert!(screen.wants_live());
    }

    #[test]
    fn live_events_feed_both_stores_with_their_own_bounds() {
        let mut screen = DashboardScreen::new(&small_feeds());
        for ts in 1..=10 {
            screen.apply(ScreenUpdate::Live(Event::new(ts, "pane_output")));
        }
        assert_eq!(screen.live.len(), 5);
        assert_eq!(screen.timeline.len(), 3);
        assert_eq!(screen.timeline.latest().and_then(|e| e.ts), Some(10));
    }

    #[test]
    fn snapshot_events_replace_timeline_only() {
        let mut screen = DashboardScreen::new(&small_feeds());
        screen.apply(ScreenUpdate::Live(Event::new(99, "dispatch")));
        screen.apply(ScreenUpdate::Snapshot(Snapshot::Events(vec![
            Event::new(3, "pane_output"),
            Event::new(2, "pane_output"),
        ])));

        let timeline: Vec<i64> = screen.timeline.iter().filter_map(|e| e.ts).collect();
        assert_eq!(timeline, vec![3, 2]);
        assert_eq!(screen.live.len(), 1);
    }

    #[test]
    fn derived_views_follow_collections() {
        let mut screen = DashboardScreen::new(&FeedsConfig::default());
        screen.apply(ScreenUpdate::Snapshot(Snapshot::Jobs(vec![Job::new("j1")
            .with_agent("alpha")
            .with_tokens(TokenCounts::exact(Some(7), Some(3), None))])));
        assert_eq!(screen.tokens_by_agent.len(), 1);
        assert_eq!(screen.tokens_by_agent[0].total(), 10);

        screen.apply(ScreenUpdate::Live(
            Event::new(5, "pane_output").with_tokens(TokenCounts::estimated(None, None, Some(12))),
        ));
        assert_eq!(screen.token_series, vec![TokenPoint { ts: 5, tokens: 12 }]);
    }

    #[test]
    fn unrelated_snapshots_are_ignored() {
        let mut screen = DashboardScreen::new(&FeedsConfig::default());
        screen.apply(ScreenUpdate::Snapshot(Snapshot::Diagnostics(Default::default())));
        assert!(screen.agents.is_empty());
        assert!(screen.timeline.is_empty());
    }
}
