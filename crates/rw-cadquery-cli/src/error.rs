//! CLI error types.

use rw_cadquery_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Walk(#[from] ignore::Error),

    #[error("{0}")]
    Validation(String),
}
