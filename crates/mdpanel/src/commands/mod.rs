//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod toc;

use std::io::{Read, Write};
use std::path::Path;

use mdpanel_config::{CliSettings, Config};

pub(crate) use render::RenderArgs;
pub(crate) use toc::TocArgs;

use crate::error::CliError;
use crate::output::Output;

/// Load configuration, reporting which file was used.
fn load_config(
    path: Option<&Path>,
    settings: &CliSettings,
    output: &Output,
) -> Result<Config, CliError> {
    let config = Config::load(path, Some(settings))?;
    if let Some(path) = &config.config_path {
        output.info(&format!("Config: {}", path.display()));
    }
    tracing::debug!(
        lang_prefix = %config.render.lang_prefix,
        heading_ids = config.render.heading_ids,
        heading_id_prefix = %config.render.heading_id_prefix,
        link_target = ?config.render.link_target,
        wrap_document = config.output.wrap_document,
        "Resolved configuration"
    );
    Ok(config)
}

/// Read markdown from `input`, or from stdin when it is absent or `-`.
fn read_input(input: Option<&Path>) -> Result<String, CliError> {
    let source = match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)?,
        _ => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            source
        }
    };
    tracing::debug!(
        input = %input.map_or_else(|| "<stdin>".into(), Path::to_string_lossy),
        bytes = source.len(),
        "Read markdown"
    );
    Ok(source)
}

/// Write `content` to `path`, or to stdout.
fn write_output(path: Option<&Path>, content: &str) -> Result<(), CliError> {
    match path {
        Some(path) => std::fs::write(path, content)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
