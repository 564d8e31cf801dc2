//! IBM Cloud Object Storage uploads.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use coslift_core::{DEFAULT_IAM_ENDPOINT, default_cos_endpoint};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;

use crate::auth::{AuthError, Credential, IamClient};
use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::transport::TransportError;

/// Header carrying the COS service instance ID.
pub const SERVICE_INSTANCE_HEADER: &str = "ibm-service-instance-id";

const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Canonical address of an uploaded object: `cos://{bucket}/{key}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosLocator {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for CosLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cos://{}/{}", self.bucket, self.key)
    }
}

/// Object key for a deployment's source archive:
/// `deployments/{deployment_id}/{YYYYMMDD_HHMMSS}_source.zip`.
pub fn archive_object_key(deployment_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "deployments/{deployment_id}/{}_source.zip",
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Where and how to reach the bucket.
#[derive(Debug, Clone)]
pub struct CosSettings {
    pub region: String,
    pub bucket: String,
    /// Defaults to `s3.{region}.cloud-object-storage.appdomain.cloud`
    pub endpoint: Option<String>,
    pub service_instance_id: Option<String>,
    /// Used to exchange an API key for a bearer token
    pub iam_endpoint: String,
}

impl CosSettings {
    pub fn new(region: &str, bucket: &str) -> Self {
        Self {
            region: region.to_owned(),
            bucket: bucket.to_owned(),
            endpoint: None,
            service_instance_id: None,
            iam_endpoint: DEFAULT_IAM_ENDPOINT.to_owned(),
        }
    }
}

/// Storage client handle for a single bucket.
pub struct CosUploader<E: HttpExecutor = ReqwestExecutor> {
    executor: E,
    credential: Credential,
    bucket: String,
    base_url: String,
    service_instance_id: Option<String>,
    iam_endpoint: String,
    api_key_token: OnceCell<SecretString>,
}

/// Build an uploader for `bucket` with the default HTTP executor.
pub fn create_client(
    credential: Credential,
    region: &str,
    bucket: &str,
    endpoint: Option<&str>,
) -> CosUploader {
    let mut settings = CosSettings::new(region, bucket);
    settings.endpoint = endpoint.map(str::to_owned);
    CosUploader::new(credential, settings)
}

impl CosUploader<ReqwestExecutor> {
    pub fn new(credential: Credential, settings: CosSettings) -> Self {
        Self::with_executor(ReqwestExecutor::new(), credential, settings)
    }
}

impl<E: HttpExecutor> CosUploader<E> {
    pub fn with_executor(executor: E, credential: Credential, settings: CosSettings) -> Self {
        let endpoint = settings
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| default_cos_endpoint(&settings.region));
        let base_url = if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
            endpoint.trim_end_matches('/').to_owned()
        } else {
            format!("https://{}", endpoint.trim_end_matches('/'))
        };
        let service_instance_id = settings
            .service_instance_id
            .filter(|id| !id.trim().is_empty());

        tracing::info!(
            bucket = %settings.bucket,
            endpoint = %base_url,
            auth = credential.method(),
            "initialized COS client"
        );
        if service_instance_id.is_none() {
            tracing::warn!(
                "no COS service instance ID configured; requests are sent without {SERVICE_INSTANCE_HEADER}"
            );
        }

        Self {
            executor,
            credential,
            bucket: settings.bucket,
            base_url,
            service_instance_id,
            iam_endpoint: settings.iam_endpoint,
            api_key_token: OnceCell::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Path-style object URL: `{endpoint}/{bucket}/{key}`.
    ///
    /// Each `/`-separated segment of the key is percent-encoded.
    pub fn object_url(&self, key: &str) -> String {
        let path = key
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}/{}", self.base_url, self.bucket, path)
    }

    /// Upload a source archive under a timestamped key for `deployment_id`.
    ///
    /// Returns the object locator and the local archive path, which the
    /// caller may delete afterwards.
    pub async fn upload_archive(
        &self,
        archive_path: &Path,
        deployment_id: &str,
    ) -> Result<(CosLocator, PathBuf), StorageError> {
        self.upload_archive_at(archive_path, deployment_id, Utc::now())
            .await
    }

    /// [`upload_archive`](Self::upload_archive) with an explicit timestamp.
    pub async fn upload_archive_at(
        &self,
        archive_path: &Path,
        deployment_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(CosLocator, PathBuf), StorageError> {
        let key = archive_object_key(deployment_id, at);
        let locator = self.upload_file(archive_path, Some(&key)).await?;
        Ok((locator, archive_path.to_path_buf()))
    }

    /// Upload a local file. The object key defaults to the file name.
    pub async fn upload_file(
        &self,
        local_path: &Path,
        object_key: Option<&str>,
    ) -> Result<CosLocator, StorageError> {
        if !local_path.is_file() {
            return Err(StorageError::FileNotFound(local_path.to_path_buf()));
        }
        let key = match object_key {
            Some(key) => key.to_owned(),
            None => local_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| StorageError::FileNotFound(local_path.to_path_buf()))?,
        };

        let upload_err = |source| StorageError::Upload {
            bucket: self.bucket.clone(),
            key: key.clone(),
            source,
        };

        tracing::info!(
            path = %local_path.display(),
            bucket = %self.bucket,
            key = %key,
            "uploading file to COS"
        );

        let body = tokio::fs::read(local_path)
            .await
            .map_err(|e| upload_err(UploadFailure::Read(e)))?;
        let mut headers = self
            .auth_headers()
            .await
            .map_err(|e| upload_err(UploadFailure::Auth(e)))?;
        headers.push((
            "Content-Type".to_owned(),
            ARCHIVE_CONTENT_TYPE.to_owned(),
        ));

        let size_bytes = body.len();
        self.executor
            .put(&self.object_url(&key), &headers, body)
            .await
            .map_err(|e| upload_err(UploadFailure::Transport(e)))?;

        let locator = CosLocator {
            bucket: self.bucket.clone(),
            key,
        };
        tracing::info!(locator = %locator, size_bytes, "upload completed");
        Ok(locator)
    }

    /// Delete an object. Failures are logged and otherwise ignored.
    pub async fn delete_object(&self, object_key: &str) {
        let headers = match self.auth_headers().await {
            Ok(headers) => headers,
            Err(e) => {
                tracing::warn!(key = %object_key, error = %e, "failed to delete object from COS");
                return;
            }
        };

        match self
            .executor
            .delete(&self.object_url(object_key), &headers)
            .await
        {
            Ok(()) => tracing::info!(bucket = %self.bucket, key = %object_key, "deleted object"),
            Err(e) => {
                tracing::warn!(key = %object_key, error = %e, "failed to delete object from COS")
            }
        }
    }

    async fn auth_headers(&self) -> Result<Vec<(String, String)>, AuthError> {
        let token = match &self.credential {
            Credential::Bearer { access_token, .. } => access_token.expose_secret().to_owned(),
            Credential::ApiKey(api_key) => self
                .api_key_token
                .get_or_try_init(|| async {
                    let iam = IamClient::with_executor(&self.executor, &self.iam_endpoint);
                    iam.exchange_api_key(api_key).await.map(|t| t.access_token)
                })
                .await?
                .expose_secret()
                .to_owned(),
        };

        let mut headers = vec![("Authorization".to_owned(), format!("Bearer {token}"))];
        if let Some(id) = &self.service_instance_id {
            headers.push((SERVICE_INSTANCE_HEADER.to_owned(), id.clone()));
        }
        Ok(headers)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to upload to cos://{bucket}/{key}")]
    Upload {
        bucket: String,
        key: String,
        source: UploadFailure,
    },
}

/// Why an upload failed.
#[derive(Debug, thiserror::Error)]
pub enum UploadFailure {
    #[error("failed to read local file")]
    Read(#[source] std::io::Error),

    #[error("failed to authorize request")]
    Auth(#[source] AuthError),

    #[error(transparent)]
    Transport(TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bearer() -> Credential {
        Credential::Bearer {
            access_token: SecretString::from("token"),
            expires_in: None,
        }
    }

    #[test]
    fn object_key_layout() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            archive_object_key("dep123", at),
            "deployments/dep123/20240102_030405_source.zip"
        );
    }

    #[test]
    fn object_keys_differ_across_seconds() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 6).unwrap();
        assert_ne!(archive_object_key("d", a), archive_object_key("d", b));
        assert_ne!(archive_object_key("d1", a), archive_object_key("d2", a));
    }

    #[test]
    fn locator_display() {
        let locator = CosLocator {
            bucket: "b".to_owned(),
            key: "deployments/x/y.zip".to_owned(),
        };
        assert_eq!(locator.to_string(), "cos://b/deployments/x/y.zip");
    }

    #[test]
    fn object_url_uses_regional_default_endpoint() {
        let uploader = CosUploader::new(bearer(), CosSettings::new("us-south", "my-bucket"));
        assert_eq!(
            uploader.object_url("a/b.zip"),
            "https://s3.us-south.cloud-object-storage.appdomain.cloud/my-bucket/a/b.zip"
        );
    }

    #[test]
    fn object_url_honors_custom_endpoint() {
        let plain = create_client(bearer(), "eu-de", "b", Some("cos.example.com/"));
        assert_eq!(plain.object_url("k"), "https://cos.example.com/b/k");

        let with_scheme = create_client(bearer(), "eu-de", "b", Some("http://127.0.0.1:9000"));
        assert_eq!(with_scheme.object_url("k"), "http://127.0.0.1:9000/b/k");

        let blank = create_client(bearer(), "eu-de", "b", Some("  "));
        assert_eq!(
            blank.object_url("k"),
            "https://s3.eu-de.cloud-object-storage.appdomain.cloud/b/k"
        );
    }

    #[test]
    fn object_url_encodes_key_segments() {
        let uploader = create_client(bearer(), "eu-de", "b", Some("cos.example.com"));
        assert_eq!(uploader.object_url("a?b.zip"), "https://cos.example.com/b/a%3Fb.zip");
        assert_eq!(
            uploader.object_url("dir #1/100%.zip"),
            "https://cos.example.com/b/dir%20%231/100%25.zip"
        );
        assert_eq!(
            uploader.object_url("deployments/dep-1/20240102_030405_source.zip"),
            "https://cos.example.com/b/deployments/dep-1/20240102_030405_source.zip"
        );
    }
}
