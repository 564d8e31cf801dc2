use std::path::Path;

use coslift::cloud::{CheckStatus, ChecksReporter};
use coslift::pipeline::{self, CredentialConfig, StorageConfig};
use coslift::{DeployConfig, Secrets, VercelEnv};

use super::{config_path, source_dir_for};

/// Archive the source tree and upload it to COS.
pub async fn deploy(
    config_arg: Option<&Path>,
    source_arg: Option<&Path>,
    keep_archive: bool,
) -> anyhow::Result<()> {
    println!("[1/4] Loading configuration...");
    let config_path = config_path(config_arg);
    let config = DeployConfig::load(&config_path)?;
    let env = VercelEnv::from_env();
    let secrets = Secrets::from_env();

    println!("  Region: {}", config.ibm_cloud.region);
    println!("  Project ID: {}", config.ibm_cloud.project_id);
    println!("  COS Bucket: {}", config.ibm_cloud.cos_bucket);
    println!("  App Name: {}", env.app_name());
    println!("  Git Ref: {}", env.git_commit_ref);
    println!("  Commit SHA: {}", env.short_sha());

    let source_dir = match source_arg {
        Some(dir) => dir.to_path_buf(),
        None => source_dir_for(&config_path, &config.source_dir),
    };

    let reporter = ChecksReporter::new(secrets.checks_token.clone());
    let check_id = (!env.is_local()).then_some(env.deployment_id.as_str());
    reporter.start(check_id, None).await;

    println!("[2/4] Authenticating with IBM Cloud...");
    println!("[3/4] Uploading source code to IBM Cloud Object Storage...");
    let result = pipeline::run(
        &source_dir,
        &env.deployment_id,
        config.exclude.as_deref(),
        &CredentialConfig::new(&config.ibm_cloud, &secrets),
        &StorageConfig::new(&config.ibm_cloud, &secrets),
    )
    .await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            let message = e.to_string();
            reporter
                .complete(check_id, CheckStatus::Failed, None, Some(&message))
                .await;
            return Err(e.into());
        }
    };

    let locator = outcome.locator.to_string();
    println!("  Source uploaded: {locator}");

    println!("[4/4] Deploying to Code Engine...");
    println!("  Code Engine deployment is not performed by coslift");
    println!("  Next step: use {locator} to create or update the Code Engine application");

    reporter
        .complete(check_id, CheckStatus::Succeeded, Some(&locator), None)
        .await;

    if config.cleanup_artifacts && !keep_archive {
        let archive = outcome.archive_path();
        println!("Cleaning up local artifact: {}", archive.display());
        if let Err(e) = std::fs::remove_file(archive) {
            tracing::warn!(path = %archive.display(), error = %e, "failed to remove local archive");
        }
    } else {
        println!("Local archive kept at {}", outcome.archive_path().display());
    }

    Ok(())
}
