use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::Settings;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExecutionRequest {
    pub(crate) lab_id: String,
    pub(crate) step_id: String,
    pub(crate) code: String,
    pub(crate) execution_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ExecutionResult {
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) output: String,
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) hints: Vec<String>,
}

#[derive(Debug, Error)]
pub(crate) enum SandboxError {
    #[error("Code execution sandbox is not configured")]
    NotConfigured,
    #[error("Code execution sandbox is unavailable")]
    Unavailable(#[source] reqwest::Error),
    #[error("Code execution sandbox returned status {0}")]
    Rejected(u16),
}

/// Runs learner code for a lab step somewhere outside this process.
#[async_trait]
pub(crate) trait CodeSandbox: Send + Sync {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, SandboxError>;
}

#[derive(Debug, Clone)]
pub(crate) struct HttpSandbox {
    client: Client,
    base_url: Option<String>,
    api_key: String,
}

impl HttpSandbox {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let sandbox = settings.sandbox();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(sandbox.request_timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: sandbox
                .is_configured()
                .then(|| sandbox.base_url.trim_end_matches('/').to_string()),
            api_key: sandbox.api_key.clone(),
        })
    }
}

#[async_trait]
impl CodeSandbox for HttpSandbox {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, SandboxError> {
        let base_url = self.base_url.as_deref().ok_or(SandboxError::NotConfigured)?;

        let mut call = self.client.post(format!("{base_url}/execute")).json(&request);
        if !self.api_key.is_empty() {
            call = call.bearer_auth(&self.api_key);
        }

        let response = call.send().await.map_err(SandboxError::Unavailable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SandboxError::Rejected(status.as_u16()));
        }

        response.json::<ExecutionResult>().await.map_err(SandboxError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn unconfigured_sandbox_refuses_to_run() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::remove_var("SANDBOX_BASE_URL");

        let settings = Settings::load().expect("settings");
        let sandbox = HttpSandbox::from_settings(&settings).expect("sandbox");

        let err = sandbox
            .execute(ExecutionRequest {
                lab_id: "lab".into(),
                step_id: "step".into(),
                code: "print(1)".into(),
                execution_type: "python".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SandboxError::NotConfigured));
    }

    #[test]
    fn result_tolerates_sparse_payload() {
        let result: ExecutionResult = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(result.success);
        assert!(result.output.is_empty());
        assert!(result.hints.is_empty());
    }
}
