//! Drives a [`Screen`] on a tokio task.
//!
//! The task is the only writer of the screen. It issues snapshot requests
//! concurrently, merges live events as they arrive and publishes the screen
//! through a `watch` channel after every change.

use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::client::{Snapshot, SnapshotClient, StreamClient, StreamConfig, StreamHandle};
use crate::types::Event;

use super::{Screen, ScreenUpdate};

type Pending = FuturesUnordered<BoxFuture<'static, Snapshot>>;
type Modifier<S> = Box<dyn FnOnce(&mut S) + Send>;

enum Command<S> {
    Refresh,
    Modify(Modifier<S>),
    Teardown,
}

/// Spawns screens onto the runtime.
pub struct ScreenRunner;

impl ScreenRunner {
    /// Start driving `screen`.
    ///
    /// The screen's snapshot requests are issued immediately. When the screen
    /// wants live events and a stream config is given, one stream connection
    /// is opened for the lifetime of the runner.
    pub fn spawn<S: Screen>(
        screen: S,
        client: SnapshotClient,
        stream: Option<StreamConfig>,
    ) -> ScreenHandle<S> {
        let (state_tx, state_rx) = watch::channel(screen);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(state_tx, client, stream, command_rx));

        ScreenHandle {
            updates: state_rx,
            commands: command_tx,
            task: Some(task),
        }
    }
}

/// Handle to a running screen.
///
/// Dropping the handle stops the runner the same way [`teardown`] does,
/// without waiting for it.
///
/// [`teardown`]: ScreenHandle::teardown
pub struct ScreenHandle<S> {
    updates: watch::Receiver<S>,
    commands: mpsc::UnboundedSender<Command<S>>,
    task: Option<JoinHandle<()>>,
}

impl<S: Screen> ScreenHandle<S> {
    /// Receiver notified after every change to the screen
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.updates.clone()
    }

    /// Current state of the screen
    pub fn current(&self) -> watch::Ref<'_, S> {
        self.updates.borrow()
    }

    /// Re-issue the screen's snapshot requests
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Change the screen's inputs, then refresh.
    ///
    /// Snapshot reads still in flight were issued for the old inputs and are
    /// discarded.
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.send(Command::Modify(Box::new(f)));
    }

    /// Stop the runner and wait for it to finish.
    ///
    /// Closes the live stream and drops in-flight snapshot reads; the screen
    /// receives no update afterwards.
    pub async fn teardown(mut self) {
        self.send(Command::Teardown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Screen runner ended abnormally");
            }
        }
    }

    fn send(&self, command: Command<S>) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Screen runner already stopped");
        }
    }
}

async fn run<S: Screen>(
    state: watch::Sender<S>,
    client: SnapshotClient,
    stream: Option<StreamConfig>,
    mut commands: mpsc::UnboundedReceiver<Command<S>>,
) {
    let mut live = match stream {
        Some(config) if state.borrow().wants_live() => Some(StreamClient::new(config).connect()),
        _ => None,
    };

    let mut pending = Pending::new();
    issue(&state, &client, &mut pending);

    loop {
        tokio::select! {
            Some(snapshot) = pending.next(), if !pending.is_empty() => {
                state.send_modify(|screen| screen.apply(ScreenUpdate::Snapshot(snapshot)));
            }
            event = next_live(&mut live) => match event {
                Some(event) => {
                    state.send_modify(|screen| screen.apply(ScreenUpdate::Live(event)));
                }
                None => {
                    tracing::info!("Live stream ended");
                    live = None;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Refresh) => issue(&state, &client, &mut pending),
                Some(Command::Modify(f)) => {
                    pending = Pending::new();
                    state.send_modify(f);
                    issue(&state, &client, &mut pending);
                }
                Some(Command::Teardown) | None => break,
            },
        }
    }

    if let Some(live) = live.take() {
        live.close().await;
    }
    tracing::debug!(dropped = pending.len(), "Screen runner stopped");
}

fn issue<S: Screen>(state: &watch::Sender<S>, client: &SnapshotClient, pending: &mut Pending) {
    let requests = state.borrow().requests();
    for request in requests {
        let client = client.clone();
        pending.push(Box::pin(async move { client.execute(request).await }));
    }
}

async fn next_live(live: &mut Option<StreamHandle>) -> Option<Event> {
    match live {
        Some(handle) => handle.recv().await,
        None => std::future::pending().await,
    }
}
