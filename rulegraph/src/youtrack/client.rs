//! YouTrack REST client: fetch workflows with their rules.

use tracing::debug;

use crate::tools::ToolError;

use super::Workflow;

const WORKFLOW_FIELDS: &str = "id,name,rules(id,title,script,$type)";

/// Thin wrapper over the YouTrack admin workflows endpoint.
///
/// Transport failures surface as [`ToolError::Transport`], consumed by the
/// tool loop's error-string policy; they are never raised into the graph.
pub struct YoutrackClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl YoutrackClient {
    /// Creates a client for `base_url` (trailing slash tolerated) using a
    /// permanent token for Bearer auth.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Fetches all workflows (with rules) visible to the token's account.
    pub async fn get_workflow_rules(&self) -> Result<Vec<Workflow>, ToolError> {
        let url = format!("{}/api/admin/workflows", self.base_url);
        debug!(url = %url, "fetching YouTrack workflows");

        let response = self
            .http
            .get(&url)
            .query(&[("fields", WORKFLOW_FIELDS)])
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ToolError::Transport(format!("YouTrack request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Transport(format!(
                "YouTrack API returned {}",
                status
            )));
        }

        response
            .json::<Vec<Workflow>>()
            .await
            .map_err(|e| ToolError::Transport(format!("YouTrack response decode failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: a trailing slash on the base URL is stripped once at
    /// construction so request URLs have no double slashes.
    #[test]
    fn new_strips_trailing_slash() {
        let client = YoutrackClient::new("https://yt.example.com/", "tok");
        assert_eq!(client.base_url, "https://yt.example.com");
    }

    /// **Scenario**: a request against an unreachable host yields Transport.
    #[tokio::test]
    async fn unreachable_host_yields_transport_error() {
        let client = YoutrackClient::new("http://127.0.0.1:1", "tok");
        match client.get_workflow_rules().await {
            Err(ToolError::Transport(_)) => {}
            other => panic!("expected Transport error, got {:?}", other),
        }
    }
}
