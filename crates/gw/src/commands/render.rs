//! `gw render` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use gw_config::ConfigHandle;
use gw_renderer::WikiRenderer;

use super::ConfigArgs;
use crate::error::CliError;

/// Arguments for the render command.
#[derive(Args, Debug)]
pub(crate) struct RenderArgs {
    /// Markdown file to render.
    file: PathBuf,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep soft line breaks as spaces.
    #[arg(long)]
    no_breaks: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl RenderArgs {
    /// Render a single file through the wiki pipeline.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let breaks = self.no_breaks.then_some(false);
        let config = ConfigHandle::new(self.config.load(breaks)?);
        let renderer = WikiRenderer::from_config(config);

        let source = std::fs::read_to_string(&self.file)?;
        let html = renderer.render(&source);
        tracing::info!(file = %self.file.display(), bytes = html.len(), "Rendered file");

        match self.output {
            Some(path) => std::fs::write(path, html)?,
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(html.as_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}
