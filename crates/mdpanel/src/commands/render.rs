//! `mdpanel render` command implementation.

use std::path::PathBuf;

use clap::Args;
use mdpanel_config::CliSettings;
use mdpanel_markdown::{Markdown, escape_for_attribute};

use super::{load_config, read_input, write_output};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to convert (default: stdin).
    input: Option<PathBuf>,

    /// Write HTML to this file instead of stdout.
    #[arg(short = 'o', long = "output")]
    output_file: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdpanel.toml).
    #[arg(short, long, env = "MDPANEL_CONFIG")]
    config: Option<PathBuf>,

    /// Class prefix for fenced code languages (overrides config).
    #[arg(long)]
    lang_prefix: Option<String>,

    /// Omit `id` attributes on headings.
    #[arg(long)]
    no_heading_ids: bool,

    /// Prefix for heading ids (overrides config).
    #[arg(long)]
    heading_id_prefix: Option<String>,

    /// `target` attribute for links, e.g. `_blank` (overrides config).
    #[arg(long)]
    link_target: Option<String>,

    /// Wrap the HTML in a standalone document.
    #[arg(long)]
    wrap_document: bool,

    /// Document title when wrapping (overrides config).
    #[arg(long)]
    title: Option<String>,
}

impl RenderArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            lang_prefix: self.lang_prefix,
            heading_ids: self.no_heading_ids.then_some(false),
            heading_id_prefix: self.heading_id_prefix,
            link_target: self.link_target,
            wrap_document: self.wrap_document.then_some(true),
            title: self.title,
        };
        let config = load_config(self.config.as_deref(), &cli_settings, &output)?;

        let source = read_input(self.input.as_deref())?;
        let markdown = Markdown::with_options(config.render.to_options());
        let mut html = markdown.to_html(&source)?;
        if config.output.wrap_document {
            html = wrap_document(&html, &config.output.title);
        }

        write_output(self.output_file.as_deref(), &html)?;
        if let Some(path) = &self.output_file {
            output.success(&format!("Wrote {}", path.display()));
        }
        Ok(())
    }
}

/// Wrap an HTML fragment in a minimal standalone page.
fn wrap_document(body: &str, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape_for_attribute(title)
    )
}
