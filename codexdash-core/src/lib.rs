//! # codexdash-core
//!
//! Core library for codexdash - a live telemetry console for a fleet of agents.
//!
//! This library provides:
//! - Domain types for agents, jobs and events
//! - Snapshot (REST) and live stream (WebSocket) clients
//! - A capacity-bounded event store
//! - Pure aggregation over agents, jobs and events
//! - Screen-scoped view models and the runner that keeps them in sync
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data reaches a screen through two paths:
//! - **Snapshots:** point-in-time reads issued on screen entry and on refresh
//! - **Live stream:** events pushed by the server as they happen
//!
//! Both paths end in [`screen::Screen::apply`], which folds the update into
//! the screen's collections and recomputes the derived views.
//!
//! ## Example
//!
//! ```rust,no_run
//! use codexdash_core::screen::{DashboardScreen, ScreenRunner};
//! use codexdash_core::{Config, SnapshotClient};
//!
//! # async fn run() -> codexdash_core::Result<()> {
//! let config = Config::load()?;
//! let client = SnapshotClient::new(&config.server)?;
//! let screen = DashboardScreen::new(&config.feeds);
//! let handle = ScreenRunner::spawn(screen, client, Some(config.stream_config()?));
//!
//! let mut updates = handle.subscribe();
//! updates.changed().await.ok();
//! println!("{} agents", updates.borrow().agents.len());
//!
//! handle.teardown().await;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use client::{DispatchClient, SnapshotClient, StreamClient, StreamHandle};
pub use config::Config;
pub use error::{Error, Result};
pub use store::EventStore;
pub use types::*;

// Public modules
pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod screen;
pub mod store;
pub mod tokens;
pub mod types;
