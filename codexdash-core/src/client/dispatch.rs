//! Prompt dispatch via `POST /api/dispatch`

use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::error::Result;

/// Body of a dispatch request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchRequest {
    /// Agent names to send the prompt to
    pub targets: Vec<String>,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdir: Option<String>,
    /// Correlation id the resulting job will carry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl DispatchRequest {
    pub fn new(targets: Vec<String>, prompt: impl Into<String>) -> Self {
        Self {
            targets,
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Response from `POST /api/dispatch`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DispatchResponse {
    pub ok: bool,
    /// Process id of the spawned sender
    #[serde(default)]
    pub pid: Option<i64>,
    #[serde(default)]
    pub job_id: Option<String>,
}

/// HTTP client for dispatching prompts to agents
#[derive(Debug, Clone)]
pub struct DispatchClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl DispatchClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let (http_client, base_url) = super::http_client(config)?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Send a prompt to the requested agents
    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchResponse> {
        let url = format!("{}/api/dispatch", self.base_url);

        let response = self.http_client.post(&url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(super::status_error(response).await);
        }

        let result: DispatchResponse = response.json().await?;
        tracing::info!(
            targets = ?request.targets,
            pid = ?result.pid,
            job_id = ?result.job_id,
            "Dispatched prompt"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_unset_options() {
        let request = DispatchRequest::new(vec!["alpha".into()], "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"targets": ["alpha"], "prompt": "hello"}));
    }

    #[test]
    fn test_request_includes_set_options() {
        let request = DispatchRequest {
            parallel: Some(true),
            job_id: Some("j-1".into()),
            ..DispatchRequest::new(vec!["a".into(), "b".into()], "go")
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["parallel"], true);
        assert_eq!(json["job_id"], "j-1");
        assert!(json.get("wait").is_none());
    }

    #[test]
    fn test_response_without_pid() {
        let response: DispatchResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(response.ok);
        assert_eq!(response.pid, None);
    }
}
