mod archive;
mod config;
mod deploy;

use std::path::{Path, PathBuf};

use coslift::CONFIG_FILE_NAME;

pub use archive::archive;
pub use config::show_config;
pub use deploy::deploy;

/// The `--config` argument, or `coslift.toml` in the working directory.
pub(crate) fn config_path(arg: Option<&Path>) -> PathBuf {
    arg.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// `source_dir` from the config is relative to the config file's directory.
pub(crate) fn source_dir_for(config_path: &Path, source_dir: &Path) -> PathBuf {
    if source_dir.is_absolute() {
        return source_dir.to_path_buf();
    }
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(source_dir),
        _ => source_dir.to_path_buf(),
    }
}
