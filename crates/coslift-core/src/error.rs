use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration file not found: {0}; create coslift.toml in your project root")]
    ConfigNotFound(PathBuf),

    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("missing required config field `{field}`")]
    MissingField { field: &'static str },

    #[error("invalid config field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}
