use thiserror::Error;

/// Errors raised while loading configuration from the environment or from
/// the YAML taxonomy and location files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    FileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
