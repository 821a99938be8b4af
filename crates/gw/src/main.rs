//! gitwiki CLI.
//!
//! Provides commands for:
//! - `render`: Render a markdown file through the wiki pipeline
//! - `generate`: Regenerate the index and sidebar pages
//! - `components`: Show the state of the special component files

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ComponentsArgs, GenerateArgs, RenderArgs};
use error::CliError;
use output::Output;

/// gitwiki - Git-backed wiki tools.
#[derive(Parser)]
#[command(name = "gw", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file to HTML.
    Render(RenderArgs),
    /// Regenerate the index and sidebar pages.
    Generate(GenerateArgs),
    /// Show component files.
    Components(ComponentsArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Render(args) => args.config.verbose,
            Self::Generate(args) => args.config.verbose,
            Self::Components(args) => args.config.verbose,
        }
    }

    fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Render(args) => args.execute(),
            Self::Generate(args) => {
                let rt = tokio::runtime::Runtime::new()?;
                rt.block_on(args.execute())
            }
            Self::Components(args) => args.execute(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.command.execute() {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from(["gw", "render", "page.md", "--no-breaks", "-v"]).unwrap();
        assert!(cli.command.verbose());
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn test_parse_generate_with_overrides() {
        let cli = Cli::try_parse_from([
            "gw",
            "generate",
            "--repository",
            "/tmp/wiki",
            "--proxy-path",
            "/w",
        ])
        .unwrap();
        assert!(!cli.command.verbose());
    }

    #[test]
    fn test_render_requires_file() {
        assert!(Cli::try_parse_from(["gw", "render"]).is_err());
    }
}
