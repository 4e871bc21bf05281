//! Screen-scoped view models
//!
//! Each screen owns its collections and derived data. Nothing is shared
//! between screens: two screens on the same server hold independent stores
//! and independent stream connections.
//!
//! A screen is driven by a [`ScreenRunner`], which issues the screen's
//! snapshot requests, feeds it live events and publishes the updated screen
//! to observers after every change.

mod agents;
mod dashboard;
mod job_detail;
mod jobs;
mod runner;

pub use agents::AgentsScreen;
pub use dashboard::DashboardScreen;
pub use job_detail::{JobDetailScreen, JobDetailState};
pub use jobs::JobsScreen;
pub use runner::{ScreenHandle, ScreenRunner};

use crate::client::{Snapshot, SnapshotRequest};
use crate::types::Event;

/// Input folded into a screen
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenUpdate {
    /// Result of one of the screen's snapshot requests
    Snapshot(Snapshot),
    /// Event pushed over the live stream
    Live(Event),
}

/// A view model that can be kept in sync by a [`ScreenRunner`].
pub trait Screen: Send + Sync + 'static {
    /// Snapshot reads to issue on entry and on every refresh.
    fn requests(&self) -> Vec<SnapshotRequest>;

    /// Fold an update in and recompute derived data.
    ///
    /// Updates the screen did not ask for are ignored.
    fn apply(&mut self, update: ScreenUpdate);

    /// Whether the screen consumes the live stream.
    fn wants_live(&self) -> bool {
        false
    }
}
