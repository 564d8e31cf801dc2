//! IBM Cloud IAM authentication.
//!
//! Two credential sources are supported, checked in order by
//! [`IamClient::resolve`]:
//!
//! 1. **OIDC token exchange**: a Vercel OIDC token plus an IBM Trusted
//!    Profile ID are exchanged for a short-lived IAM access token.
//! 2. **API key**: a static IBM Cloud API key, used as-is. It is exchanged
//!    for an access token lazily by the storage client.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::transport::TransportError;

/// Grant type for exchanging a compute-resource (OIDC) token.
pub const CR_TOKEN_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:cr-token";

/// Grant type for exchanging an API key.
pub const API_KEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Minimum plausible length of an IBM Cloud API key.
const MIN_API_KEY_LEN: usize = 20;

/// Authentication material for IBM Cloud services.
#[derive(Clone)]
pub enum Credential {
    /// Static API key (`IBM_CLOUD_API_KEY`).
    ApiKey(SecretString),
    /// IAM access token obtained through OIDC token exchange.
    Bearer {
        access_token: SecretString,
        expires_in: Option<u64>,
    },
}

impl Credential {
    /// Short label of the authentication method, safe to log.
    pub fn method(&self) -> &'static str {
        match self {
            Credential::ApiKey(_) => "api-key",
            Credential::Bearer { .. } => "oidc",
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey(_) => f.debug_tuple("ApiKey").field(&"[REDACTED]").finish(),
            Credential::Bearer { expires_in, .. } => f
                .debug_struct("Bearer")
                .field("access_token", &"[REDACTED]")
                .field("expires_in", expires_in)
                .finish(),
        }
    }
}

/// An access token issued by IAM.
#[derive(Clone)]
pub struct IssuedToken {
    pub access_token: SecretString,
    pub expires_in: Option<u64>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// IAM token endpoint client, parameterized over the executor for testability.
pub struct IamClient<E: HttpExecutor = ReqwestExecutor> {
    executor: E,
    endpoint: String,
}

impl IamClient<ReqwestExecutor> {
    pub fn new(endpoint: &str) -> Self {
        Self::with_executor(ReqwestExecutor::new(), endpoint)
    }
}

impl<E: HttpExecutor> IamClient<E> {
    pub fn with_executor(executor: E, endpoint: &str) -> Self {
        Self {
            executor,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/identity/token", self.endpoint)
    }

    /// Pick the authentication method and produce a [`Credential`].
    ///
    /// Priority:
    /// 1. OIDC exchange, when both `oidc_token` and `trusted_profile_id` are present
    /// 2. API key, when `api_key` is present (no network call)
    /// 3. [`AuthError::NoCredential`]
    ///
    /// Empty values count as absent. An OIDC exchange failure is returned
    /// as-is; it never falls back to the API key.
    pub async fn resolve(
        &self,
        trusted_profile_id: Option<&str>,
        api_key: Option<&SecretString>,
        oidc_token: Option<&SecretString>,
    ) -> Result<Credential, AuthError> {
        let profile_id = trusted_profile_id.filter(|p| !p.trim().is_empty());
        let oidc_token = oidc_token.filter(|t| !t.expose_secret().trim().is_empty());
        let api_key = api_key.filter(|k| !k.expose_secret().trim().is_empty());

        if let (Some(token), Some(profile_id)) = (oidc_token, profile_id) {
            tracing::info!(profile_id, "using OIDC authentication (Vercel -> IBM Trusted Profile)");
            return self.exchange_oidc_token(token, profile_id).await;
        }

        if let Some(key) = api_key {
            if !validate_api_key(key.expose_secret()) {
                tracing::warn!("IBM Cloud API key looks malformed (shorter than {MIN_API_KEY_LEN} characters)");
            }
            tracing::info!("using API key authentication");
            return Ok(Credential::ApiKey(key.clone()));
        }

        if oidc_token.is_some() {
            tracing::debug!("OIDC token present but no trusted profile ID configured");
        }
        Err(AuthError::NoCredential)
    }

    /// Exchange an OIDC token for an IAM access token via a Trusted Profile.
    pub async fn exchange_oidc_token(
        &self,
        oidc_token: &SecretString,
        profile_id: &str,
    ) -> Result<Credential, AuthError> {
        let token = self
            .request_token(vec![
                ("grant_type".to_owned(), CR_TOKEN_GRANT_TYPE.to_owned()),
                ("cr_token".to_owned(), oidc_token.expose_secret().to_owned()),
                ("profile_id".to_owned(), profile_id.to_owned()),
            ])
            .await?;

        tracing::info!(
            expires_in = ?token.expires_in,
            "OIDC token exchanged for IBM IAM access token"
        );
        Ok(Credential::Bearer {
            access_token: token.access_token,
            expires_in: token.expires_in,
        })
    }

    /// Exchange an API key for an IAM access token.
    pub async fn exchange_api_key(&self, api_key: &SecretString) -> Result<IssuedToken, AuthError> {
        let token = self
            .request_token(vec![
                ("grant_type".to_owned(), API_KEY_GRANT_TYPE.to_owned()),
                ("apikey".to_owned(), api_key.expose_secret().to_owned()),
            ])
            .await?;

        tracing::debug!(expires_in = ?token.expires_in, "API key exchanged for IBM IAM access token");
        Ok(token)
    }

    async fn request_token(&self, form: Vec<(String, String)>) -> Result<IssuedToken, AuthError> {
        let url = self.token_url();
        tracing::debug!(url = %url, "requesting IAM token");

        let body = self
            .executor
            .post_form(&url, &form)
            .await
            .map_err(|e| AuthError::AuthExchange {
                source: ExchangeFailure::Transport(e),
            })?;

        let response: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::AuthExchange {
                source: ExchangeFailure::InvalidJson(e),
            })?;

        let access_token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::AuthExchange {
                source: ExchangeFailure::MissingAccessToken,
            })?;

        Ok(IssuedToken {
            access_token: SecretString::from(access_token),
            expires_in: response.expires_in,
        })
    }
}

/// Basic format check for an API key. Does not contact IAM.
pub fn validate_api_key(api_key: &str) -> bool {
    api_key.trim().len() >= MIN_API_KEY_LEN
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(
        "no valid authentication method available; set VERCEL_OIDC_TOKEN with a trusted profile ID, or set IBM_CLOUD_API_KEY"
    )]
    NoCredential,

    #[error("failed to exchange token with IBM IAM")]
    AuthExchange { source: ExchangeFailure },
}

/// Why an IAM token exchange failed.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeFailure {
    #[error(transparent)]
    Transport(TransportError),

    #[error("token response is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("token response has no access_token")]
    MissingAccessToken,
}
