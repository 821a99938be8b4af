//! `gw generate` command implementation.

use std::sync::Arc;

use clap::Args;
use gw_config::ConfigHandle;
use gw_site::Wiki;
use gw_storage::FsStorage;

use super::ConfigArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the generate command.
#[derive(Args, Debug)]
pub(crate) struct GenerateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl GenerateArgs {
    /// Regenerate the index and sidebar pages.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = ConfigHandle::new(self.config.load(None)?);
        let storage = Arc::new(FsStorage::new(config.repository_dir()));
        let wiki = Wiki::new(config, storage);

        let report = wiki.components().generate().await?;
        for file in &report.written {
            output.success(&format!("Generated {file}"));
        }
        output.detail(&format!("{} pages listed", report.pages.len()));
        Ok(())
    }
}
