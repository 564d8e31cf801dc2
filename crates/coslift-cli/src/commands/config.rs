use std::path::Path;

use coslift::cloud::validate_api_key;
use coslift::{DeployConfig, Secrets, VercelEnv};
use secrecy::ExposeSecret;

use super::{config_path, source_dir_for};

/// Print the resolved configuration without secrets.
pub fn show_config(config_arg: Option<&Path>) -> anyhow::Result<()> {
    let config_path = config_path(config_arg);
    let config = DeployConfig::load(&config_path)?;
    let env = VercelEnv::from_env();
    let secrets = Secrets::from_env();
    let ibm = &config.ibm_cloud;

    println!("Configuration ({})", config_path.display());
    println!("  Region: {}", ibm.region);
    println!("  Project ID: {}", ibm.project_id);
    println!("  COS Bucket: {}", ibm.cos_bucket);
    println!("  COS Endpoint: {}", ibm.cos_endpoint());
    println!("  IAM Endpoint: {}", ibm.iam_endpoint);
    println!(
        "  Source Dir: {}",
        source_dir_for(&config_path, &config.source_dir).display()
    );
    println!("  Cleanup Artifacts: {}", config.cleanup_artifacts);
    match &config.exclude {
        Some(patterns) => println!("  Exclude: {} custom patterns", patterns.len()),
        None => println!("  Exclude: defaults"),
    }

    println!("Scaling");
    let scaling = &config.scaling;
    println!("  Instances: {}..{}", scaling.min_scale, scaling.max_scale);
    println!("  CPU / Memory: {} / {}", scaling.cpu, scaling.memory);
    println!("  Port: {}", scaling.port);
    println!("  Concurrency: {}", scaling.concurrency);

    println!("Deployment");
    println!("  App Name: {}", env.app_name());
    println!("  Git Ref: {}", env.git_commit_ref);
    println!("  Commit SHA: {}", env.short_sha());
    println!("  Deployment ID: {}", env.deployment_id);
    println!("  Authentication: {}", auth_method(&config, &secrets));
    Ok(())
}

/// Which credential the pipeline would use, without revealing it.
fn auth_method(config: &DeployConfig, secrets: &Secrets) -> &'static str {
    let has_profile = config
        .ibm_cloud
        .trusted_profile_id
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());

    match (&secrets.oidc_token, &secrets.api_key) {
        (Some(_), _) if has_profile => "OIDC (trusted profile)",
        (_, Some(key)) if validate_api_key(key.expose_secret()) => "API key",
        (_, Some(_)) => "API key (looks malformed)",
        _ => "none",
    }
}
