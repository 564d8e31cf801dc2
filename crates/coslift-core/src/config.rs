use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default configuration file name, looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "coslift.toml";

/// Default IBM Cloud IAM endpoint used for token exchange.
pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.cloud.ibm.com";

/// coslift.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    pub ibm_cloud: IbmCloudConfig,
    #[serde(default)]
    pub scaling: ScalingConfig,
    /// Directory to archive, relative to the config file's directory
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Delete the local archive after a successful upload
    #[serde(default = "default_cleanup_artifacts")]
    pub cleanup_artifacts: bool,
    /// Exclusion patterns. When None, the built-in defaults apply.
    /// When Some, the list replaces the defaults entirely.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbmCloudConfig {
    /// IBM Cloud region (e.g. us-south)
    pub region: String,
    /// Code Engine project ID
    pub project_id: String,
    /// COS bucket receiving source archives
    pub cos_bucket: String,
    /// COS endpoint host. Derived from the region when omitted.
    #[serde(default)]
    pub cos_endpoint: Option<String>,
    /// Container registry pull secret (consumed by the deployment phase)
    #[serde(default)]
    pub registry_secret: Option<String>,
    /// Trusted Profile ID enabling OIDC token exchange
    #[serde(default)]
    pub trusted_profile_id: Option<String>,
    /// COS service instance CRN
    #[serde(default)]
    pub service_instance_id: Option<String>,
    /// IAM endpoint for token exchange
    #[serde(default = "default_iam_endpoint")]
    pub iam_endpoint: String,
}

/// Code Engine application scaling. Passed through to the deployment phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    #[serde(default)]
    pub min_scale: u32,
    #[serde(default = "default_max_scale")]
    pub max_scale: u32,
    #[serde(default = "default_cpu")]
    pub cpu: String,
    #[serde(default = "default_memory")]
    pub memory: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            min_scale: 0,
            max_scale: default_max_scale(),
            cpu: default_cpu(),
            memory: default_memory(),
            port: default_port(),
            concurrency: default_concurrency(),
        }
    }
}

impl IbmCloudConfig {
    /// The configured COS endpoint, or the regional public endpoint.
    pub fn cos_endpoint(&self) -> String {
        match self.cos_endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint.to_owned(),
            _ => default_cos_endpoint(&self.region),
        }
    }
}

impl DeployConfig {
    /// Load and validate `coslift.toml` from the given path.
    ///
    /// Unlike optional tool settings, the `[ibm_cloud]` section is mandatory,
    /// so a missing file is an error rather than a fallback to defaults.
    pub fn load(config_path: &Path) -> crate::Result<Self> {
        if !config_path.exists() {
            return Err(crate::Error::ConfigNotFound(config_path.to_path_buf()));
        }

        let content =
            std::fs::read_to_string(config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.to_path_buf(),
                source: e,
            })?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;

        tracing::debug!(
            path = %config_path.display(),
            region = %config.ibm_cloud.region,
            bucket = %config.ibm_cloud.cos_bucket,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load `coslift.toml` from a project directory.
    pub fn load_from_dir(project_dir: &Path) -> crate::Result<Self> {
        Self::load(&project_dir.join(CONFIG_FILE_NAME))
    }

    fn validate(&self) -> crate::Result<()> {
        let required = [
            ("ibm_cloud.region", &self.ibm_cloud.region),
            ("ibm_cloud.project_id", &self.ibm_cloud.project_id),
            ("ibm_cloud.cos_bucket", &self.ibm_cloud.cos_bucket),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(crate::Error::MissingField { field });
            }
        }

        if self.scaling.min_scale > self.scaling.max_scale {
            return Err(crate::Error::InvalidField {
                field: "scaling.min_scale",
                reason: format!(
                    "min_scale ({}) exceeds max_scale ({})",
                    self.scaling.min_scale, self.scaling.max_scale
                ),
            });
        }

        Ok(())
    }
}

/// Public COS endpoint for a region.
pub fn default_cos_endpoint(region: &str) -> String {
    format!("s3.{region}.cloud-object-storage.appdomain.cloud")
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_cleanup_artifacts() -> bool {
    true
}

fn default_iam_endpoint() -> String {
    DEFAULT_IAM_ENDPOINT.to_owned()
}

fn default_max_scale() -> u32 {
    10
}

fn default_cpu() -> String {
    "0.25".to_owned()
}

fn default_memory() -> String {
    "0.5G".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_concurrency() -> u32 {
    100
}
