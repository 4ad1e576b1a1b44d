//! CLI error types.

use weft_build::BuildError;
use weft_config::ConfigError;
use weft_server::ServerError;
use weft_sprite::SpriteError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Sprite(#[from] SpriteError),

    #[error("{0}")]
    Server(#[from] ServerError),
}
