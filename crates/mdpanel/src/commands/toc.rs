//! `mdpanel toc` command implementation.

use std::fmt::Write;
use std::path::PathBuf;

use clap::Args;
use mdpanel_config::CliSettings;
use mdpanel_markdown::{Markdown, TocEntry};

use super::{load_config, read_input, write_output};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the toc command.
#[derive(Args)]
pub(crate) struct TocArgs {
    /// Markdown file to read (default: stdin).
    input: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdpanel.toml).
    #[arg(short, long, env = "MDPANEL_CONFIG")]
    config: Option<PathBuf>,

    /// Print entries as JSON.
    #[arg(long)]
    json: bool,
}

impl TocArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = load_config(self.config.as_deref(), &CliSettings::default(), &output)?;
        let source = read_input(self.input.as_deref())?;
        let toc = Markdown::with_options(config.render.to_options())
            .render(&source)?
            .toc;

        if self.json {
            let mut json = serde_json::to_string_pretty(&toc)?;
            json.push('\n');
            return write_output(None, &json);
        }

        if toc.is_empty() {
            output.warning("No headings found");
            return Ok(());
        }
        write_output(None, &format_outline(&toc))
    }
}

/// One line per heading, indented two spaces per level below the first.
fn format_outline(toc: &[TocEntry]) -> String {
    let mut out = String::new();
    for entry in toc {
        let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
        let _ = writeln!(out, "{indent}- {} (#{})", entry.title, entry.id);
    }
    out
}
