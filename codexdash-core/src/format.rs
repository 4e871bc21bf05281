//! Formatting helpers shared across front ends.

use chrono::{DateTime, Local, Utc};

/// Format an epoch-millis timestamp as relative time (e.g., "2m ago").
///
/// Missing or zero timestamps render as `-`.
pub fn format_relative_ms(ts: Option<i64>) -> String {
    match ts.filter(|&ms| ms > 0).and_then(DateTime::from_timestamp_millis) {
        Some(ts) => format_relative_time(ts, Utc::now()),
        None => "-".to_string(),
    }
}

/// Format `ts` relative to `now`.
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Local wall-clock time (`HH:MM:SS`) of an epoch-millis timestamp, or `-`.
pub fn format_clock(ts: Option<i64>) -> String {
    ts.filter(|&ms| ms > 0)
        .and_then(DateTime::from_timestamp_millis)
        .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Job duration as `42s` or `3m 5s`; missing or zero durations render as `-`.
pub fn format_duration_ms(ms: Option<i64>) -> String {
    let ms = match ms {
        Some(ms) if ms > 0 => ms,
        _ => return "-".to_string(),
    };
    let secs = ms / 1000;
    if secs < 60 {
        return format!("{}s", secs);
    }
    format!("{}m {}s", secs / 60, secs % 60)
}
