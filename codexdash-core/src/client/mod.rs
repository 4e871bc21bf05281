//! Clients for the codexdash server.
//!
//! - [`SnapshotClient`] performs point-in-time reads over REST. List reads
//!   never fail from the caller's point of view: transport and decode errors
//!   are logged and resolve to empty collections.
//! - [`StreamClient`] owns one WebSocket connection to `/ws/events` and
//!   delivers decoded events through a [`StreamHandle`].
//! - [`DispatchClient`] sends prompts to agents via `POST /api/dispatch`.
//!
//! ## Configuration
//!
//! ```toml
//! [server]
//! base_url = "http://127.0.0.1:8000"
//! timeout_secs = 10
//!
//! [stream]
//! reconnect = false
//! ```

mod dispatch;
mod snapshot;
mod stream;

pub use dispatch::{DispatchClient, DispatchRequest, DispatchResponse};
pub use snapshot::{JobDetailOutcome, Snapshot, SnapshotClient, SnapshotRequest};
pub use stream::{decode_frame, StreamClient, StreamConfig, StreamHandle};

use std::time::Duration;

use crate::config::ServerConfig;
use crate::error::{Error, Result};

/// Build the shared HTTP client and normalized base URL for a server.
fn http_client(config: &ServerConfig) -> Result<(reqwest::Client, String)> {
    let base = url::Url::parse(config.base_url.trim())
        .map_err(|e| Error::Config(format!("invalid server.base_url: {}", e)))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "server.base_url must use http or https, got {}",
            base.scheme()
        )));
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

    let base_url = config.base_url.trim().trim_end_matches('/').to_string();
    Ok((http_client, base_url))
}

/// Turn a non-success response into [`Error::Status`].
async fn status_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown".to_string());
    Error::Status { status, body }
}
