//! Deployment status reporting through the Vercel Checks API.
//!
//! Reporting is fire-and-forget: a missing deployment ID or token skips the
//! update, and transport failures are logged without failing the deployment.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::executor::{HttpExecutor, ReqwestExecutor};

pub const VERCEL_API_BASE: &str = "https://api.vercel.com";

/// Name of the check shown on the Vercel deployment.
pub const CHECK_NAME: &str = "coslift";

const START_TITLE: &str = "Deploying to IBM Cloud";
const START_SUMMARY: &str = "Uploading build artifacts to IBM Cloud Object Storage.";
const RESULT_TITLE: &str = "Deployment Result";

/// Final state of a deployment check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Succeeded,
    Failed,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Succeeded => "succeeded",
            CheckStatus::Failed => "failed",
        }
    }
}

pub struct ChecksReporter<E: HttpExecutor = ReqwestExecutor> {
    executor: E,
    api_base: String,
    token: Option<SecretString>,
}

impl ChecksReporter<ReqwestExecutor> {
    pub fn new(token: Option<SecretString>) -> Self {
        Self::with_executor(ReqwestExecutor::new(), VERCEL_API_BASE, token)
    }
}

impl<E: HttpExecutor> ChecksReporter<E> {
    pub fn with_executor(executor: E, api_base: &str, token: Option<SecretString>) -> Self {
        Self {
            executor,
            api_base: api_base.trim_end_matches('/').to_owned(),
            token: token.filter(|t| !t.expose_secret().is_empty()),
        }
    }

    /// Mark the deployment check as in progress.
    pub async fn start(&self, deployment_id: Option<&str>, summary: Option<&str>) {
        let Some((deployment_id, token)) = self.target(deployment_id, "check start") else {
            return;
        };

        let payload = json!({
            "checks": [{
                "name": CHECK_NAME,
                "status": "in-progress",
                "detailsUrl": null,
                "externalId": deployment_id,
                "output": {
                    "title": START_TITLE,
                    "summary": summary.unwrap_or(START_SUMMARY),
                },
            }]
        });
        self.post(deployment_id, token, &payload).await;
    }

    /// Complete the deployment check with a final status.
    ///
    /// `url` is shown on success, `error` on failure.
    pub async fn complete(
        &self,
        deployment_id: Option<&str>,
        status: CheckStatus,
        url: Option<&str>,
        error: Option<&str>,
    ) {
        let Some((deployment_id, token)) = self.target(deployment_id, "check completion") else {
            return;
        };

        let summary = match status {
            CheckStatus::Succeeded => format!("Deployment succeeded. URL: {}", url.unwrap_or("")),
            CheckStatus::Failed => {
                format!("Deployment failed: {}", error.unwrap_or("Unknown error"))
            }
        };
        let payload = json!({
            "checks": [{
                "name": CHECK_NAME,
                "status": status.as_str(),
                "detailsUrl": url,
                "externalId": deployment_id,
                "output": {
                    "title": RESULT_TITLE,
                    "summary": summary,
                },
            }]
        });
        self.post(deployment_id, token, &payload).await;
    }

    fn target<'a>(
        &'a self,
        deployment_id: Option<&'a str>,
        action: &str,
    ) -> Option<(&'a str, &'a SecretString)> {
        let Some(deployment_id) = deployment_id.filter(|id| !id.is_empty()) else {
            tracing::warn!("missing Vercel deployment ID; skipping {action}");
            return None;
        };
        let Some(token) = self.token.as_ref() else {
            tracing::warn!("Vercel checks token not provided; skipping {action}");
            return None;
        };
        Some((deployment_id, token))
    }

    async fn post(&self, deployment_id: &str, token: &SecretString, payload: &serde_json::Value) {
        let url = format!("{}/v1/deployments/{deployment_id}/checks", self.api_base);
        match self
            .executor
            .post_json(&url, token.expose_secret(), payload)
            .await
        {
            Ok(()) => tracing::debug!(deployment_id, "updated Vercel check"),
            Err(e) => tracing::warn!(deployment_id, error = %e, "failed to update Vercel check"),
        }
    }
}
