//! Core types and configuration for coslift.
//!
//! This crate defines the `coslift.toml` schema ([`DeployConfig`]), the
//! build-environment readers ([`VercelEnv`], [`Secrets`]), and shared
//! error types.

pub mod config;
pub mod env;
pub mod error;

pub use config::{
    CONFIG_FILE_NAME, DEFAULT_IAM_ENDPOINT, DeployConfig, IbmCloudConfig, ScalingConfig,
    default_cos_endpoint,
};
pub use env::{LOCAL_DEPLOYMENT_ID, Secrets, VercelEnv};
pub use error::{Error, Result};
