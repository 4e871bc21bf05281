//! codexdash - live telemetry console for a fleet of agents
//!
//! Drives the codexdash-core screens headlessly and prints them as text.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/codexdash/config.toml (~/.config/codexdash/config.toml)
//! - Logs: $XDG_STATE_HOME/codexdash/codexdash.log (~/.local/state/codexdash/codexdash.log)

mod render;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use codexdash_core::client::{DispatchClient, DispatchRequest};
use codexdash_core::config::Config;
use codexdash_core::screen::{
    AgentsScreen, DashboardScreen, JobDetailScreen, JobDetailState, JobsScreen, Screen,
    ScreenRunner, ScreenUpdate,
};
use codexdash_core::{JobFilter, SnapshotClient, Status, StreamClient};

#[derive(Parser)]
#[command(name = "codexdash")]
#[command(about = "Live telemetry console for a fleet of agents")]
#[command(version)]
struct Args {
    /// Server base URL (overrides config and CODEXDASH_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Agents, token usage and the controller timeline
    Dashboard {
        /// Keep running and reprint on every change until Ctrl-C
        #[arg(short, long)]
        follow: bool,
    },

    /// List jobs, filtered by the server
    Jobs {
        /// Only jobs with this status (running, done, blocked, error, idle)
        #[arg(short, long)]
        status: Option<Status>,

        /// Only jobs run by this agent
        #[arg(short, long)]
        agent: Option<String>,

        /// Maximum number of jobs (default: from config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one job with its events and transcript
    Job {
        job_id: String,

        /// Write the transcript to <DIR>/<job_id>-transcript.txt
        #[arg(long, value_name = "DIR")]
        save_transcript: Option<PathBuf>,
    },

    /// Per-agent activity feeds and pane diagnostics
    Agents {
        /// Only show this agent
        #[arg(short, long)]
        agent: Option<String>,

        /// Keep running and reprint on every change until Ctrl-C
        #[arg(short, long)]
        follow: bool,
    },

    /// Pane diagnostics per agent
    Doctor,

    /// Check that the server is up
    Health,

    /// Print live events until Ctrl-C
    Watch,

    /// Send a prompt to one or more agents
    Dispatch {
        /// Target agent names
        #[arg(required = true)]
        targets: Vec<String>,

        #[arg(short, long)]
        prompt: String,

        /// Run targets in parallel
        #[arg(long)]
        parallel: bool,

        /// Wait for completion
        #[arg(long)]
        wait: bool,

        /// Output directory on the server host
        #[arg(long)]
        outdir: Option<String>,

        /// Correlation id for the resulting job
        #[arg(long)]
        job_id: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(url) = args.url {
        config.server.base_url = url;
        config.validate().context("invalid --url")?;
    }

    let _log_guard =
        codexdash_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(base_url = %config.server.base_url, "codexdash starting");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(run(args.command, config))
}

async fn run(command: Command, config: Config) -> Result<()> {
    let client = SnapshotClient::new(&config.server).context("failed to create client")?;

    match command {
        Command::Dashboard { follow } => {
            let screen = DashboardScreen::new(&config.feeds);
            if follow {
                follow_screen(screen, client, &config, render::dashboard).await
            } else {
                render::dashboard(&load_once(screen, &client).await);
                Ok(())
            }
        }
        Command::Jobs {
            status,
            agent,
            limit,
        } => {
            let mut screen = JobsScreen::with_filter(JobFilter::new(
                limit.unwrap_or(config.feeds.jobs_limit),
            ));
            screen.set_status(status);
            screen.set_agent(agent);
            render::jobs(&load_once(screen, &client).await);
            Ok(())
        }
        Command::Job {
            job_id,
            save_transcript,
        } => cmd_job(&client, job_id, save_transcript).await,
        Command::Agents { agent, follow } => {
            let screen = AgentsScreen::new(&config.feeds);
            let only = agent.clone();
            let print = move |screen: &AgentsScreen| render::agents(screen, only.as_deref());
            if follow {
                follow_screen(screen, client, &config, print).await
            } else {
                print(&load_once(screen, &client).await);
                Ok(())
            }
        }
        Command::Doctor => {
            let diagnostics = client
                .try_fetch_diagnostics()
                .await
                .context("failed to fetch diagnostics")?;
            render::diagnostics(&diagnostics);
            Ok(())
        }
        Command::Health => {
            let health = client.try_health().await.context("health check failed")?;
            if !health.ok {
                bail!("server at {} reports unhealthy", client.base_url());
            }
            println!(
                "ok  {}  server time {}",
                client.base_url(),
                codexdash_core::format::format_clock(health.ts)
            );
            Ok(())
        }
        Command::Watch => cmd_watch(&config).await,
        Command::Dispatch {
            targets,
            prompt,
            parallel,
            wait,
            outdir,
            job_id,
        } => {
            let dispatcher =
                DispatchClient::new(&config.server).context("failed to create client")?;
            let request = DispatchRequest {
                parallel: parallel.then_some(true),
                wait: wait.then_some(true),
                outdir,
                job_id,
                ..DispatchRequest::new(targets, prompt)
            };
            let response = dispatcher
                .dispatch(&request)
                .await
                .context("dispatch failed")?;
            if !response.ok {
                bail!("server rejected the dispatch");
            }
            println!(
                "Dispatched to {} (pid {}, job {})",
                request.targets.join(", "),
                response.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                response.job_id.as_deref().unwrap_or("-")
            );
            Ok(())
        }
    }
}

/// Issue a screen's snapshot requests once and fold the results in
async fn load_once<S: Screen>(mut screen: S, client: &SnapshotClient) -> S {
    let snapshots = futures_util::future::join_all(
        screen
            .requests()
            .into_iter()
            .map(|request| client.execute(request)),
    )
    .await;

    for snapshot in snapshots {
        screen.apply(ScreenUpdate::Snapshot(snapshot));
    }
    screen
}

/// Run a screen with the live stream and reprint it after every change
async fn follow_screen<S, F>(
    screen: S,
    client: SnapshotClient,
    config: &Config,
    print: F,
) -> Result<()>
where
    S: Screen,
    F: Fn(&S),
{
    let stream = config
        .stream_config()
        .context("failed to resolve stream URL")?;
    tracing::info!(url = %stream.url, "Following screen");

    let handle = ScreenRunner::spawn(screen, client, Some(stream));
    let mut updates = handle.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let screen = updates.borrow_and_update();
                println!();
                print(&*screen);
            }
        }
    }

    handle.teardown().await;
    Ok(())
}

async fn cmd_job(
    client: &SnapshotClient,
    job_id: String,
    save_transcript: Option<PathBuf>,
) -> Result<()> {
    let screen = load_once(JobDetailScreen::new(job_id), client).await;
    render::job_detail(&screen);

    match &screen.state {
        JobDetailState::Loaded { .. } => {}
        JobDetailState::NotFound => bail!("job {} not found", screen.job_id()),
        _ => bail!("failed to load job {}", screen.job_id()),
    }

    if let Some(dir) = save_transcript {
        let path = screen
            .save_transcript(&dir)
            .context("failed to save transcript")?;
        println!();
        println!("Transcript saved to {}", path.display());
    }
    Ok(())
}

async fn cmd_watch(config: &Config) -> Result<()> {
    let stream = config
        .stream_config()
        .context("failed to resolve stream URL")?;
    println!("Watching {} (Ctrl-C to stop)", stream.url);

    let mut handle = StreamClient::new(stream).connect();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = handle.recv() => match event {
                Some(event) => println!("{}", render::event_line(&event)),
                None => {
                    println!("Stream closed");
                    break;
                }
            },
        }
    }

    handle.close().await;
    Ok(())
}
