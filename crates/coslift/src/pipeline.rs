//! The deployment pipeline: credentials, archive, upload.
//!
//! ```text
//! run(source_dir, deployment_id, exclude, credentials, storage)
//!   1. Rules    ── compile exclusion patterns (defaults when none given)
//!   2. Resolve  ── OIDC exchange or API key (IamClient)
//!   3. Client   ── CosUploader for the configured bucket
//!   4. Archive  ── zip the source tree into a scratch file
//!   5. Upload   ── deployments/{id}/{timestamp}_source.zip
//! ```
//!
//! Any step failing aborts the run. The local archive is left on disk for
//! the caller to remove, including when the upload fails.

use std::fmt;
use std::path::{Path, PathBuf};

use coslift_build::{ArchiveSummary, ExcludeRules, build_archive};
use coslift_cloud::{CosLocator, CosSettings, CosUploader, HttpExecutor, IamClient, ReqwestExecutor};
use coslift_core::{IbmCloudConfig, Secrets};
use secrecy::SecretString;

use crate::PipelineError;

/// Inputs for credential resolution.
#[derive(Clone)]
pub struct CredentialConfig {
    pub trusted_profile_id: Option<String>,
    pub api_key: Option<SecretString>,
    pub oidc_token: Option<SecretString>,
    pub iam_endpoint: String,
}

impl CredentialConfig {
    pub fn new(ibm_cloud: &IbmCloudConfig, secrets: &Secrets) -> Self {
        Self {
            trusted_profile_id: ibm_cloud.trusted_profile_id.clone(),
            api_key: secrets.api_key.clone(),
            oidc_token: secrets.oidc_token.clone(),
            iam_endpoint: ibm_cloud.iam_endpoint.clone(),
        }
    }
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("trusted_profile_id", &self.trusted_profile_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("oidc_token", &self.oidc_token.as_ref().map(|_| "[REDACTED]"))
            .field("iam_endpoint", &self.iam_endpoint)
            .finish()
    }
}

/// Target bucket for the upload.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    pub endpoint: Option<String>,
    pub service_instance_id: Option<String>,
}

impl StorageConfig {
    /// The service instance ID comes from `coslift.toml` first, then
    /// `IBM_COS_SERVICE_INSTANCE_ID`.
    pub fn new(ibm_cloud: &IbmCloudConfig, secrets: &Secrets) -> Self {
        Self {
            region: ibm_cloud.region.clone(),
            bucket: ibm_cloud.cos_bucket.clone(),
            endpoint: ibm_cloud.cos_endpoint.clone(),
            service_instance_id: ibm_cloud
                .service_instance_id
                .clone()
                .or_else(|| secrets.service_instance_id.clone()),
        }
    }
}

/// A completed pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub locator: CosLocator,
    pub archive: ArchiveSummary,
}

impl PipelineOutcome {
    pub fn archive_path(&self) -> &Path {
        &self.archive.path
    }
}

/// Run the pipeline against IBM Cloud.
///
/// `exclude` replaces the default exclusion list when given.
pub async fn run(
    source_dir: &Path,
    deployment_id: &str,
    exclude: Option<&[String]>,
    credentials: &CredentialConfig,
    storage: &StorageConfig,
) -> Result<PipelineOutcome, PipelineError> {
    let executor = ReqwestExecutor::new();
    run_with(&executor, source_dir, deployment_id, exclude, credentials, storage, None).await
}

/// [`run`] with an explicit executor and optional archive location.
pub async fn run_with<E: HttpExecutor>(
    executor: &E,
    source_dir: &Path,
    deployment_id: &str,
    exclude: Option<&[String]>,
    credentials: &CredentialConfig,
    storage: &StorageConfig,
    archive_output: Option<PathBuf>,
) -> Result<PipelineOutcome, PipelineError> {
    let rules = match exclude {
        Some(patterns) => ExcludeRules::new(patterns)?,
        None => ExcludeRules::defaults(),
    };

    let iam = IamClient::with_executor(executor, &credentials.iam_endpoint);
    let credential = iam
        .resolve(
            credentials.trusted_profile_id.as_deref(),
            credentials.api_key.as_ref(),
            credentials.oidc_token.as_ref(),
        )
        .await?;

    let settings = CosSettings {
        region: storage.region.clone(),
        bucket: storage.bucket.clone(),
        endpoint: storage.endpoint.clone(),
        service_instance_id: storage.service_instance_id.clone(),
        iam_endpoint: credentials.iam_endpoint.clone(),
    };
    let uploader = CosUploader::with_executor(executor, credential, settings);

    tracing::info!(source = %source_dir.display(), "creating source archive");
    let archive = build_archive(source_dir, &rules, archive_output.as_deref())?;

    let (locator, _) = uploader.upload_archive(&archive.path, deployment_id).await?;
    tracing::info!(locator = %locator, deployment_id, "source uploaded");

    Ok(PipelineOutcome { locator, archive })
}
