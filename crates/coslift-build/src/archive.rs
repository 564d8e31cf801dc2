use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::exclude::ExcludeRules;

/// Result of a successful [`build_archive`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Path of the written zip file
    pub path: PathBuf,
    /// Number of files stored in the archive
    pub entries: usize,
    /// Size of the zip file on disk
    pub size_bytes: u64,
}

impl ArchiveSummary {
    pub fn size_mib(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }
}

/// Zips the regular files under `source_dir` that no rule excludes.
///
/// Entries are named by their `/`-separated path relative to the source
/// root and stored with deflate compression. Symlinks and directories are
/// not archived. When `output` is `None`, the archive is written to
/// [`default_output_path`]. The archive never contains itself, even when
/// `output` lies inside `source_dir`.
///
/// The source tree is checked before anything is written: a missing
/// `source_dir` fails with [`ArchiveError::SourceNotFound`] and leaves no
/// file behind.
pub fn build_archive(
    source_dir: &Path,
    rules: &ExcludeRules,
    output: Option<&Path>,
) -> Result<ArchiveSummary, ArchiveError> {
    if !source_dir.exists() {
        return Err(ArchiveError::SourceNotFound(source_dir.to_path_buf()));
    }
    let root = source_dir
        .canonicalize()
        .map_err(|e| ArchiveError::ResolveSource {
            path: source_dir.to_path_buf(),
            source: e,
        })?;
    if !root.is_dir() {
        return Err(ArchiveError::SourceNotDirectory(root));
    }

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(Utc::now()),
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ArchiveError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let file = File::create(&output).map_err(|e| ArchiveError::CreateArchive {
        path: output.clone(),
        source: e,
    })?;
    let output_abs = output
        .canonicalize()
        .map_err(|e| ArchiveError::CreateArchive {
            path: output.clone(),
            source: e,
        })?;

    tracing::debug!(
        source = %root.display(),
        output = %output.display(),
        rules = rules.len(),
        "building source archive"
    );

    let mut zip = ZipWriter::new(file);
    let mut entries = 0usize;

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !(e.file_type().is_dir() && rules.prunes_dir(e.file_name()))
        });

    for entry in walker {
        let entry = entry.map_err(|e| ArchiveError::Walk {
            root: root.clone(),
            source: e,
        })?;
        if !entry.file_type().is_file() || entry.path() == output_abs.as_path() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&root)
            // arch-lint: allow(no-error-swallowing) reason="StripPrefixError carries no detail beyond the path"
            .map_err(|_| ArchiveError::OutsideRoot(entry.path().to_path_buf()))?;
        if let Some(rule) = rules.matching_rule(relative) {
            tracing::trace!(path = %relative.display(), rule, "excluded");
            continue;
        }

        add_file(&mut zip, entry.path(), &posix_name(relative))?;
        entries += 1;
    }

    zip.finish().map_err(|e| ArchiveError::Finish {
        path: output.clone(),
        source: e,
    })?;

    let size_bytes = std::fs::metadata(&output)
        .map_err(|e| ArchiveError::CreateArchive {
            path: output.clone(),
            source: e,
        })?
        .len();
    let summary = ArchiveSummary {
        path: output,
        entries,
        size_bytes,
    };

    tracing::info!(
        path = %summary.path.display(),
        entries = summary.entries,
        size_mib = format_args!("{:.2}", summary.size_mib()),
        "created source archive"
    );
    Ok(summary)
}

/// Timestamped scratch location for an archive: `{tmp}/source_{YYYYMMDD_HHMMSS}.zip`.
pub fn default_output_path(now: DateTime<Utc>) -> PathBuf {
    std::env::temp_dir().join(format!("source_{}.zip", now.format("%Y%m%d_%H%M%S")))
}

fn add_file(zip: &mut ZipWriter<File>, path: &Path, name: &str) -> Result<(), ArchiveError> {
    let mut file = File::open(path).map_err(|e| ArchiveError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let metadata = file.metadata().map_err(|e| ArchiveError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    zip.start_file(name, entry_options(&metadata))
        .map_err(|e| ArchiveError::Zip {
            entry: name.to_owned(),
            source: e,
        })?;
    io::copy(&mut file, zip).map_err(|e| ArchiveError::WriteEntry {
        entry: name.to_owned(),
        source: e,
    })?;
    Ok(())
}

#[cfg(unix)]
fn entry_options(metadata: &std::fs::Metadata) -> FileOptions {
    use std::os::unix::fs::PermissionsExt;

    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn entry_options(_metadata: &std::fs::Metadata) -> FileOptions {
    FileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// `/`-joined normal components, independent of the host separator.
fn posix_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("source path is not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    #[error("failed to resolve source directory {path}")]
    ResolveSource { path: PathBuf, source: io::Error },

    #[error("failed to create directory {path}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to create archive {path}")]
    CreateArchive { path: PathBuf, source: io::Error },

    #[error("failed to walk source tree {root}")]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },

    #[error("walked path escaped the source root: {0}")]
    OutsideRoot(PathBuf),

    #[error("failed to read {path}")]
    ReadFile { path: PathBuf, source: io::Error },

    #[error("failed to add archive entry {entry}")]
    Zip {
        entry: String,
        source: zip::result::ZipError,
    },

    #[error("failed to write archive entry {entry}")]
    WriteEntry { entry: String, source: io::Error },

    #[error("failed to finalize archive {path}")]
    Finish {
        path: PathBuf,
        source: zip::result::ZipError,
    },
}
