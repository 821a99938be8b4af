//! Errors surfaced by the `gw` binary.

use gw_components::{ComponentError, GenerateError};
use gw_config::ConfigError;

/// Anything that makes a subcommand exit non-zero.
///
/// Each variant prints its inner error unchanged; `main` adds the prefix.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Component(#[from] ComponentError),
}
