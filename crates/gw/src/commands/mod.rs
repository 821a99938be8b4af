//! CLI command implementations.

pub(crate) mod components;
pub(crate) mod generate;
pub(crate) mod render;

use std::path::PathBuf;

use clap::Args;
use gw_config::{CliSettings, Config};

pub(crate) use components::ComponentsArgs;
pub(crate) use generate::GenerateArgs;
pub(crate) use render::RenderArgs;

use crate::error::CliError;

/// Options shared by every command.
#[derive(Args, Debug, Default)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover gitwiki.toml).
    #[arg(short, long, env = "GITWIKI_CONFIG")]
    config: Option<PathBuf>,

    /// Wiki repository directory (overrides config).
    #[arg(short, long)]
    repository: Option<PathBuf>,

    /// URL prefix for generated links (overrides config).
    #[arg(long)]
    proxy_path: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConfigArgs {
    /// Load configuration with command line overrides applied.
    pub(crate) fn load(&self, gfm_breaks: Option<bool>) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            repository: self.repository.clone(),
            proxy_path: self.proxy_path.clone(),
            cache_enabled: None,
            gfm_breaks,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}
