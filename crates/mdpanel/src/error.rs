//! CLI error types.

use mdpanel_config::ConfigError;
use mdpanel_markdown::MarkdownError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Markdown(#[from] MarkdownError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
