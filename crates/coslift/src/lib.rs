//! Package a project's source tree and upload it to IBM Cloud Object Storage.
//!
//! This is the unified facade crate that re-exports all coslift sub-crates
//! and hosts the deployment [`pipeline`]. Use feature flags to control which
//! components are included.
//!
//! # Feature flags
//!
//! | Feature | Default | Crate | Description |
//! |---------|---------|-------|-------------|
//! | `core` | yes | `coslift-core` | Configuration and environment readers |
//! | `build` | yes | `coslift-build` | Exclusion rules and zip archives |
//! | `cloud` | yes | `coslift-cloud` | IAM authentication, COS uploads, status checks |
//! | `pipeline` | yes | (all of the above) | Resolve, archive, and upload in one call |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use coslift::{DeployConfig, Secrets, VercelEnv};
//! use coslift::pipeline::{self, CredentialConfig, StorageConfig};
//!
//! # async fn deploy() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DeployConfig::load_from_dir(Path::new("."))?;
//! let env = VercelEnv::from_env();
//! let secrets = Secrets::from_env();
//!
//! let outcome = pipeline::run(
//!     &config.source_dir,
//!     &env.deployment_id,
//!     config.exclude.as_deref(),
//!     &CredentialConfig::new(&config.ibm_cloud, &secrets),
//!     &StorageConfig::new(&config.ibm_cloud, &secrets),
//! )
//! .await?;
//! println!("uploaded {}", outcome.locator);
//! # Ok(())
//! # }
//! ```

// Core types flattened into root namespace for convenience.
#[cfg(feature = "core")]
pub use coslift_core::*;

/// Exclusion rules and source archive building.
#[cfg(feature = "build")]
pub mod build {
    pub use coslift_build::*;
}

/// IBM Cloud IAM, Object Storage, and Vercel Checks clients.
#[cfg(feature = "cloud")]
pub mod cloud {
    pub use coslift_cloud::*;
}

#[cfg(feature = "pipeline")]
pub mod error;
#[cfg(feature = "pipeline")]
pub mod pipeline;

#[cfg(feature = "pipeline")]
pub use error::PipelineError;
