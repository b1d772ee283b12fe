//! Configuration management for mdpanel.
//!
//! Parses `mdpanel.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `render.heading_id_prefix`
//! - `render.link_target`
//! - `output.title`

mod expand;

use std::path::{Path, PathBuf};

use mdpanel_markdown::RenderOptions;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the code block class prefix.
    pub lang_prefix: Option<String>,
    /// Override whether headings get `id` attributes.
    pub heading_ids: Option<bool>,
    /// Override the heading id prefix.
    pub heading_id_prefix: Option<String>,
    /// Override the link target.
    pub link_target: Option<String>,
    /// Override whether output is wrapped in a full HTML document.
    pub wrap_document: Option<bool>,
    /// Override the document title.
    pub title: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdpanel.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markdown rendering configuration.
    pub render: RenderConfig,
    /// Output configuration.
    pub output: OutputConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Markdown rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Prefix of the class on fenced code blocks with a language.
    pub lang_prefix: String,
    /// Whether headings get `id` attributes.
    pub heading_ids: bool,
    /// Prepended to every heading id.
    pub heading_id_prefix: String,
    /// `target` attribute for links.
    pub link_target: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let options = RenderOptions::default();
        Self {
            lang_prefix: options.lang_prefix,
            heading_ids: options.heading_ids,
            heading_id_prefix: options.heading_id_prefix,
            link_target: options.link_target,
        }
    }
}

impl RenderConfig {
    /// Converter options for this configuration.
    #[must_use]
    pub fn to_options(&self) -> RenderOptions {
        RenderOptions {
            lang_prefix: self.lang_prefix.clone(),
            heading_ids: self.heading_ids,
            heading_id_prefix: self.heading_id_prefix.clone(),
            link_target: self.link_target.clone(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Wrap rendered HTML in a minimal standalone document.
    pub wrap_document: bool,
    /// Document title used when wrapping.
    pub title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            wrap_document: false,
            title: "Documentation".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`output.title`").
        field: String,
        /// Error message (e.g., "${`DOCS_TITLE`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a value that is pasted into an attribute to be a single token.
fn require_attribute_safe(value: &str, field: &str) -> Result<(), ConfigError> {
    if let Some(c) = value
        .chars()
        .find(|&c| matches!(c, '"' | '<' | '>') || c.is_whitespace())
    {
        return Err(ConfigError::Validation(format!(
            "{field} cannot contain {c:?}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdpanel.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values. The result is validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(lang_prefix) = &settings.lang_prefix {
            self.render.lang_prefix.clone_from(lang_prefix);
        }
        if let Some(heading_ids) = settings.heading_ids {
            self.render.heading_ids = heading_ids;
        }
        if let Some(prefix) = &settings.heading_id_prefix {
            self.render.heading_id_prefix.clone_from(prefix);
        }
        if let Some(target) = &settings.link_target {
            self.render.link_target = Some(target.clone());
        }
        if let Some(wrap_document) = settings.wrap_document {
            self.output.wrap_document = wrap_document;
        }
        if let Some(title) = &settings.title {
            self.output.title.clone_from(title);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        Self::discover_from(&std::env::current_dir().ok()?)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_render()?;
        require_non_empty(&self.output.title, "output.title")?;
        Ok(())
    }

    /// Validate render configuration.
    fn validate_render(&self) -> Result<(), ConfigError> {
        require_attribute_safe(&self.render.lang_prefix, "render.lang_prefix")?;
        require_attribute_safe(&self.render.heading_id_prefix, "render.heading_id_prefix")?;
        if let Some(ref target) = self.render.link_target {
            require_non_empty(target, "render.link_target")?;
            require_attribute_safe(target, "render.link_target")?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.render.heading_id_prefix =
            expand::expand_env(&self.render.heading_id_prefix, "render.heading_id_prefix")?;
        if let Some(ref target) = self.render.link_target {
            self.render.link_target = Some(expand::expand_env(target, "render.link_target")?);
        }
        self.output.title = expand::expand_env(&self.output.title, "output.title")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.render.lang_prefix, "language-");
        assert!(config.render.heading_ids);
        assert_eq!(config.render.heading_id_prefix, "");
        assert_eq!(config.render.link_target, None);
        assert!(!config.output.wrap_document);
        assert_eq!(config.output.title, "Documentation");
        assert_eq!(config.config_path, None);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.render.to_options(), RenderOptions::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[render]
lang_prefix = "lang-"
heading_ids = false
heading_id_prefix = "doc-"
link_target = "_blank"

[output]
wrap_document = true
title = "Model Reference"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(
            config.render.to_options(),
            RenderOptions {
                lang_prefix: "lang-".to_owned(),
                heading_ids: false,
                heading_id_prefix: "doc-".to_owned(),
                link_target: Some("_blank".to_owned()),
            }
        );
        assert!(config.output.wrap_document);
        assert_eq!(config.output.title, "Model Reference");
    }

    #[test]
    fn test_parse_partial_section_keeps_defaults() {
        let toml = r#"
[render]
heading_id_prefix = "x-"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.render.lang_prefix, "language-");
        assert!(config.render.heading_ids);
        assert_eq!(config.render.heading_id_prefix, "x-");
    }

    #[test]
    fn test_parse_error() {
        let result: Result<Config, _> = toml::from_str("[render]\nheading_ids = \"yes\"\n");

        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_unsafe_prefix() {
        let mut config = Config::default();
        config.render.heading_id_prefix = "a b".to_owned();

        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: render.heading_id_prefix cannot contain ' '"
        );

        config.render.heading_id_prefix = "x\"".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_link_target_and_title() {
        let mut config = Config::default();
        config.render.link_target = Some(String::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg == "render.link_target cannot be empty"
        ));

        let mut config = Config::default();
        config.output.title = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg == "output.title cannot be empty"
        ));
    }

    #[test]
    fn test_cli_settings_override() {
        let mut config = Config::default();
        let settings = CliSettings {
            lang_prefix: Some("hl-".to_owned()),
            heading_ids: Some(false),
            heading_id_prefix: None,
            link_target: Some("_top".to_owned()),
            wrap_document: Some(true),
            title: Some("Guide".to_owned()),
        };

        config.apply_cli_settings(&settings);

        assert_eq!(config.render.lang_prefix, "hl-");
        assert!(!config.render.heading_ids);
        assert_eq!(config.render.heading_id_prefix, "");
        assert_eq!(config.render.link_target.as_deref(), Some("_top"));
        assert!(config.output.wrap_document);
        assert_eq!(config.output.title, "Guide");
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[output]\ntitle = \"Custom\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.output.title, "Custom");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_load_applies_cli_settings_then_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdpanel.toml");
        std::fs::write(&path, "[render]\nlang_prefix = \"code-\"\n").unwrap();
        let settings = CliSettings {
            lang_prefix: Some("bad prefix".to_owned()),
            ..CliSettings::default()
        };

        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdpanel.toml");
        std::fs::write(&path, "[render\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("docs").join("api");
        std::fs::create_dir_all(&nested).unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "").unwrap();

        assert_eq!(Config::discover_from(&nested), Some(path));
    }

    #[test]
    fn test_load_expands_env_vars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdpanel.toml");
        std::fs::write(
            &path,
            "[output]\ntitle = \"${MDPANEL_TEST_CONFIG_TITLE:-Fallback} docs\"\n",
        )
        .unwrap();
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDPANEL_TEST_CONFIG_TITLE");
        }

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.output.title, "Fallback docs");
    }
}
