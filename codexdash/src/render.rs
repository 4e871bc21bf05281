//! Plain-text rendering of screens

use codexdash_core::format::{format_clock, format_duration_ms, format_relative_ms};
use codexdash_core::screen::{AgentsScreen, DashboardScreen, JobDetailScreen, JobDetailState, JobsScreen};
use codexdash_core::types::{Agent, Diagnostics, Event, Job};

const RULE: &str = "============================================";

pub fn event_line(event: &Event) -> String {
    format!(
        "{}  {:<18} {:<10} {}",
        format_clock(event.ts),
        event.kind(),
        event.agent_key(),
        event.summary()
    )
}

fn agent_line(agent: &Agent) -> String {
    format!(
        "{:<16} {:<8} seen {:<10} pane {:<6} model {}",
        agent.agent,
        agent.status_label(),
        format_relative_ms(agent.last_seen),
        agent.pane_id.as_deref().unwrap_or("-"),
        agent.model.as_deref().unwrap_or("unknown")
    )
}

fn job_line(job: &Job) -> String {
    format!(
        "{:<8} {:<12} {:<8} {:>8} {:>10}  {}",
        job.short_id(),
        job.agent_key(),
        job.status_label(),
        format_duration_ms(job.duration_ms),
        job.tokens.total(),
        job.prompt_preview()
    )
}

pub fn dashboard(screen: &DashboardScreen) {
    println!("Agents ({})", screen.agents.len());
    println!("{}", RULE);
    for agent in &screen.agents {
        println!("{}", agent_line(agent));
    }

    println!();
    println!("Token usage by agent");
    println!("{}", RULE);
    for usage in &screen.tokens_by_agent {
        println!(
            "{:<16} prompt {:>8}  completion {:>8}  total {:>8}",
            usage.agent,
            usage.prompt,
            usage.completion,
            usage.total()
        );
    }

    println!();
    println!("Tokens over time");
    println!("{}", RULE);
    let series: Vec<String> = screen
        .token_series
        .iter()
        .map(|p| p.tokens.to_string())
        .collect();
    println!("{}", if series.is_empty() { "-".to_string() } else { series.join(" ") });

    println!();
    println!("Controller timeline ({})", screen.timeline.len());
    println!("{}", RULE);
    for event in &screen.timeline {
        println!("{}", event_line(event));
    }
}

pub fn jobs(screen: &JobsScreen) {
    println!("Jobs ({})", screen.jobs.len());
    println!("{}", RULE);
    for job in &screen.jobs {
        println!("{}", job_line(job));
    }
    if !screen.agent_options.is_empty() {
        println!();
        println!("Agents: {}", screen.agent_options.join(", "));
    }
}

pub fn job_detail(screen: &JobDetailScreen) {
    match &screen.state {
        JobDetailState::Loading => println!("Loading {}...", screen.job_id()),
        JobDetailState::NotFound => println!("Job {} not found", screen.job_id()),
        JobDetailState::Failed(reason) => println!("Failed to load {}: {}", screen.job_id(), reason),
        JobDetailState::Loaded {
            job,
            events,
            transcript,
            sub_agents,
        } => {
            println!("Job {}", job.job_id);
            println!("{}", RULE);
            println!("Agent:       {}", job.agent_key());
            println!("Status:      {}", job.status_label());
            println!("Started:     {}", format_clock(job.started_ts));
            println!("Duration:    {}", format_duration_ms(job.duration_ms));
            println!("Model:       {}", job.model.as_deref().unwrap_or("unknown"));
            println!(
                "Tokens:      prompt {} / completion {} / total {}",
                job.tokens.prompt(),
                job.tokens.completion(),
                job.tokens.total()
            );
            println!("Prompt:      {}", job.prompt_preview());
            if let Some(path) = &job.output_path {
                println!("Output:      {}", path);
            }
            if !sub_agents.is_empty() {
                println!("Sub-agents:  {}", sub_agents.join(", "));
            }

            println!();
            println!("Events ({})", events.len());
            println!("{}", RULE);
            for event in events {
                println!("{}", event_line(event));
            }

            println!();
            println!("Transcript");
            println!("{}", RULE);
            println!("{}", if transcript.is_empty() { "(empty)" } else { transcript.as_str() });
        }
    }
}

pub fn agents(screen: &AgentsScreen, only: Option<&str>) {
    for agent in &screen.agents {
        if only.is_some_and(|name| name != agent.agent) {
            continue;
        }
        println!("{}", agent_line(agent));
        if let Some(diag) = screen.diagnostics.get(&agent.agent) {
            println!(
                "  responsive {}  auth needed {}  mode {}",
                diag.responsive,
                diag.auth_needed,
                diag.mode.as_deref().unwrap_or("-")
            );
        }
        let count = screen.event_counts.get(&agent.agent).copied().unwrap_or(0);
        println!("  {} event(s)", count);
        for event in screen.agent_feed(&agent.agent) {
            println!("  {}", event_line(event));
        }
        println!();
    }
}

pub fn diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        println!("No agents reported");
        return;
    }
    println!(
        "{:<16} {:<6} {:<10} {:<6} {}",
        "AGENT", "PANE", "RESPONSIVE", "AUTH", "MODE"
    );
    for (agent, diag) in diagnostics {
        println!(
            "{:<16} {:<6} {:<10} {:<6} {}",
            agent,
            diag.pane_id.as_deref().unwrap_or("-"),
            if diag.responsive { "yes" } else { "no" },
            if diag.auth_needed { "needed" } else { "ok" },
            diag.mode.as_deref().unwrap_or("-")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_line_fields() {
        let event = Event::new(0, "dispatch").with_job("job-1");
        let line = event_line(&event);
        assert!(line.starts_with('-'));
        assert!(line.contains("dispatch"));
        assert!(line.contains("unknown"));
        assert!(line.ends_with("job-1"));
    }

    #[test]
    fn test_job_line_placeholders() {
        let line = job_line(&Job::new("0123456789"));
        assert!(line.starts_with("01234567 "));
        assert!(line.contains("(not captured)"));
    }
}
