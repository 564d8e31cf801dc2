use std::path::Path;

use coslift::build::{ExcludeRules, build_archive};

/// Build the source archive locally (no upload).
///
/// An empty `exclude` list keeps the default exclusions.
pub fn archive(source: &Path, output: Option<&Path>, exclude: &[String]) -> anyhow::Result<()> {
    let rules = if exclude.is_empty() {
        ExcludeRules::defaults()
    } else {
        ExcludeRules::new(exclude)?
    };

    println!("Archiving {}...", source.display());
    let summary = build_archive(source, &rules, output)?;

    println!(
        "Created {} ({} files, {:.2} MiB)",
        summary.path.display(),
        summary.entries,
        summary.size_mib()
    );
    Ok(())
}
