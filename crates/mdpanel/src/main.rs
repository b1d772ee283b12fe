//! mdpanel CLI - markdown to HTML for documentation panels.
//!
//! Provides commands for:
//! - `render`: Convert a markdown file (or stdin) to HTML
//! - `toc`: Print the heading outline of a markdown file

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, TocArgs};
use output::Output;

/// mdpanel - markdown to HTML for documentation panels.
#[derive(Parser)]
#[command(name = "mdpanel", version, about)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert markdown to HTML.
    Render(RenderArgs),
    /// Print the table of contents.
    Toc(TocArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Toc(args) => args.execute(),
    };

    if let Err(err) = result {
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
    fn test_parse_render_flags() {
        let cli = Cli::try_parse_from([
            "mdpanel",
            "render",
            "README.md",
            "-o",
            "out.html",
            "--no-heading-ids",
            "--link-target",
            "_blank",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn test_parse_toc_json() {
        let cli = Cli::try_parse_from(["mdpanel", "toc", "--json"]).unwrap();

        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Toc(_)));
    }
}
