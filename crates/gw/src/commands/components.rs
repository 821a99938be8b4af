//! `gw components` command implementation.

use std::sync::Arc;

use clap::Args;
use gw_config::{ComponentName, ConfigHandle};
use gw_site::Wiki;
use gw_storage::FsStorage;

use super::ConfigArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the components command.
#[derive(Args, Debug)]
pub(crate) struct ComponentsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ComponentsArgs {
    /// Show which component files exist and how large they are.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = ConfigHandle::new(self.config.load(None)?);
        let storage = Arc::new(FsStorage::new(config.repository_dir()));
        let wiki = Wiki::new(config, storage);

        for name in ComponentName::ALL {
            let component = wiki.components().component(name);
            let file = component.file();
            match component.fetch_sync()? {
                Some(content) => {
                    let size = content.len();
                    output.success(&format!("{:<8} {file} ({size} bytes)", name.as_str()));
                }
                None => output.warning(&format!("{:<8} {file} (missing)", name.as_str())),
            }
        }
        Ok(())
    }
}
