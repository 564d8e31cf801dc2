//! Values sourced from the build environment.
//!
//! Every reader takes a lookup closure so callers (and tests) decide where
//! values come from; [`VercelEnv::from_env`] and [`Secrets::from_env`] wire
//! the closure to the process environment.

use std::fmt;

use secrecy::SecretString;

/// Maximum length of a Code Engine application name.
const APP_NAME_MAX_LEN: usize = 63;

/// Deployment ID used when not running inside a Vercel build.
pub const LOCAL_DEPLOYMENT_ID: &str = "local";

/// Deployment metadata provided by the Vercel build environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VercelEnv {
    pub git_commit_sha: String,
    pub git_commit_ref: String,
    pub deployment_id: String,
    pub project_name: String,
}

impl VercelEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        Self {
            git_commit_sha: get("VERCEL_GIT_COMMIT_SHA", "unknown"),
            git_commit_ref: get("VERCEL_GIT_COMMIT_REF", "main"),
            deployment_id: get("VERCEL_DEPLOYMENT_ID", LOCAL_DEPLOYMENT_ID),
            project_name: get("VERCEL_PROJECT_NAME", "app"),
        }
    }

    /// Whether no Vercel deployment ID was provided.
    pub fn is_local(&self) -> bool {
        self.deployment_id == LOCAL_DEPLOYMENT_ID
    }

    /// First eight characters of the commit SHA.
    pub fn short_sha(&self) -> &str {
        match self.git_commit_sha.char_indices().nth(8) {
            Some((idx, _)) => &self.git_commit_sha[..idx],
            None => &self.git_commit_sha,
        }
    }

    /// Code Engine application name derived from project and branch.
    ///
    /// The branch is lowercased, `/` and `_` become `-`, anything else
    /// outside `[a-z0-9-]` is dropped, and an `app-` prefix is added when
    /// the result does not start with a letter. Truncated to 63 characters.
    ///
    /// ```
    /// use coslift_core::VercelEnv;
    ///
    /// let env = VercelEnv {
    ///     git_commit_sha: "abc".to_owned(),
    ///     git_commit_ref: "feature/Login_Page".to_owned(),
    ///     deployment_id: "dpl_1".to_owned(),
    ///     project_name: "shop".to_owned(),
    /// };
    /// assert_eq!(env.app_name(), "shop-feature-login-page");
    /// ```
    pub fn app_name(&self) -> String {
        let mut sanitized: String = self
            .git_commit_ref
            .to_lowercase()
            .replace(['/', '_'], "-")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();

        if !sanitized.starts_with(|c: char| c.is_ascii_alphabetic()) {
            sanitized.insert_str(0, "app-");
        }

        format!("{}-{}", self.project_name, sanitized)
            .chars()
            .take(APP_NAME_MAX_LEN)
            .collect()
    }
}

/// Secrets injected into the build environment.
///
/// Empty values are treated as unset.
#[derive(Clone, Default)]
pub struct Secrets {
    /// `IBM_CLOUD_API_KEY`
    pub api_key: Option<SecretString>,
    /// `VERCEL_OIDC_TOKEN`
    pub oidc_token: Option<SecretString>,
    /// `VERCEL_CHECKS_TOKEN`
    pub checks_token: Option<SecretString>,
    /// `IBM_COS_SERVICE_INSTANCE_ID` (not secret, but environment-scoped)
    pub service_instance_id: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &Option<SecretString>| s.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Secrets")
            .field("api_key", &redact(&self.api_key))
            .field("oidc_token", &redact(&self.oidc_token))
            .field("checks_token", &redact(&self.checks_token))
            .field("service_instance_id", &self.service_instance_id)
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secret = |key: &str| non_empty(key).map(SecretString::from);

        let secrets = Self {
            api_key: secret("IBM_CLOUD_API_KEY"),
            oidc_token: secret("VERCEL_OIDC_TOKEN"),
            checks_token: secret("VERCEL_CHECKS_TOKEN"),
            service_instance_id: non_empty("IBM_COS_SERVICE_INSTANCE_ID"),
        };

        tracing::debug!(
            api_key = secrets.api_key.is_some(),
            oidc_token = secrets.oidc_token.is_some(),
            checks_token = secrets.checks_token.is_some(),
            "secrets collected from environment"
        );
        secrets
    }
}

fn process_env(key: &str) -> Option<String> {
    // arch-lint: allow(no-silent-result-drop) reason="an unset or non-UTF-8 variable is treated as absent"
    std::env::var(key).ok()
}
