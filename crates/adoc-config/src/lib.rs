//! Configuration for the AsciiDoc parser and renderer.
//!
//! Parses `adoc.toml` configuration files with serde and provides
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
//! - `parser.base_dir`
//! - `render.assets_base`
//! - every value of `[attributes]`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use adoc_parser::{DEFAULT_MAX_INCLUDE_DEPTH, FsContentResolver, Parser};
use adoc_renderer::{Configuration, ConfigurationError, DEFAULT_SECTION_TAG};
use serde::Deserialize;

use crate::expand::EnvExpander;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "adoc.toml";

/// Upper bound accepted for `parser.max_include_depth`.
const MAX_INCLUDE_DEPTH_LIMIT: usize = 1024;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config;
/// `attributes` are merged on top of the `[attributes]` table.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Attributes given as `-a name=value`.
    pub attributes: BTreeMap<String, String>,
    /// Override include resolution root.
    pub base_dir: Option<PathBuf>,
    /// Override assets directory for `data-uri`.
    pub assets_base: Option<PathBuf>,
    /// Override section wrapper element.
    pub section_tag: Option<String>,
    /// Override the `<div class="sectionbody">` toggle.
    pub skip_section_body: Option<bool>,
    /// Override the `<div id="content">` toggle.
    pub skip_global_content_wrapper: Option<bool>,
    /// Override forwarding of `data-*` options.
    pub support_data_attributes: Option<bool>,
}

impl CliSettings {
    /// Parse a `name=value` attribute argument. A bare `name` sets an empty value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the name is empty.
    pub fn parse_attribute(argument: &str) -> Result<(String, String), ConfigError> {
        let (name, value) = argument.split_once('=').unwrap_or((argument, ""));
        let name = name.trim();
        require_non_empty(name, "attribute name")?;
        Ok((name.to_owned(), value.to_owned()))
    }
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parser configuration (paths are relative strings from TOML).
    parser: ParserConfigRaw,
    /// Renderer configuration (paths are relative strings from TOML).
    render: RenderConfigRaw,
    /// Document attributes; they override header and body entries.
    pub attributes: BTreeMap<String, String>,

    /// Resolved parser configuration (set after loading).
    #[serde(skip)]
    pub parser_resolved: ParserConfig,
    /// Resolved renderer configuration (set after loading).
    #[serde(skip)]
    pub render_resolved: RenderConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw parser configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ParserConfigRaw {
    base_dir: Option<String>,
    max_include_depth: Option<usize>,
}

/// Resolved parser configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Root directory for `include::` resolution.
    pub base_dir: PathBuf,
    /// Maximum nesting of includes.
    pub max_include_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

/// Raw renderer configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RenderConfigRaw {
    assets_base: Option<String>,
    section_tag: Option<String>,
    support_data_attributes: Option<bool>,
    skip_section_body: Option<bool>,
    skip_global_content_wrapper: Option<bool>,
}

/// Resolved renderer configuration with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Directory local images are read from for `data-uri`.
    pub assets_base: Option<PathBuf>,
    /// Section wrapper element.
    pub section_tag: String,
    pub support_data_attributes: bool,
    pub skip_section_body: bool,
    pub skip_global_content_wrapper: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            assets_base: None,
            section_tag: DEFAULT_SECTION_TAG.to_owned(),
            support_data_attributes: false,
            skip_section_body: false,
            skip_global_content_wrapper: false,
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
    /// Renderer settings rejected.
    #[error("Render configuration error: {0}")]
    Render(#[from] ConfigurationError),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.assets_base`").
        field: String,
        /// Error message (e.g., "${`ASSETS`} not set").
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

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `adoc.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
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
            tracing::debug!(path = %discovered.display(), "Discovered configuration file");
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        self.attributes.extend(
            settings
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        if let Some(base_dir) = &settings.base_dir {
            self.parser_resolved.base_dir.clone_from(base_dir);
        }
        if let Some(assets_base) = &settings.assets_base {
            self.render_resolved.assets_base = Some(assets_base.clone());
        }
        if let Some(section_tag) = &settings.section_tag {
            self.render_resolved.section_tag.clone_from(section_tag);
        }
        if let Some(skip) = settings.skip_section_body {
            self.render_resolved.skip_section_body = skip;
        }
        if let Some(skip) = settings.skip_global_content_wrapper {
            self.render_resolved.skip_global_content_wrapper = skip;
        }
        if let Some(enabled) = settings.support_data_attributes {
            self.render_resolved.support_data_attributes = enabled;
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

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            parser: ParserConfigRaw::default(),
            render: RenderConfigRaw::default(),
            attributes: BTreeMap::new(),
            parser_resolved: ParserConfig {
                base_dir: base.to_path_buf(),
                max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            },
            render_resolved: RenderConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for invalid parser settings and
    /// `ConfigError::Render` for settings the renderer rejects.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let depth = self.parser_resolved.max_include_depth;
        if depth == 0 {
            return Err(ConfigError::Validation(
                "parser.max_include_depth must be greater than 0".to_owned(),
            ));
        }
        if depth > MAX_INCLUDE_DEPTH_LIMIT {
            return Err(ConfigError::Validation(format!(
                "parser.max_include_depth cannot exceed {MAX_INCLUDE_DEPTH_LIMIT}"
            )));
        }
        require_non_empty(&self.render_resolved.section_tag, "render.section_tag")?;
        for name in self.attributes.keys() {
            require_non_empty(name.trim(), "attribute name")?;
        }
        self.to_configuration().validate()?;
        Ok(())
    }

    /// Renderer configuration.
    pub fn to_configuration(&self) -> Configuration {
        let render = &self.render_resolved;
        let mut configuration = Configuration::default()
            .with_attributes(self.attributes.clone())
            .with_section_tag(render.section_tag.clone())
            .with_support_data_attributes(render.support_data_attributes)
            .with_skip_section_body(render.skip_section_body)
            .with_skip_global_content_wrapper(render.skip_global_content_wrapper);
        if let Some(assets_base) = &render.assets_base {
            configuration = configuration.with_assets_base(assets_base.clone());
        }
        configuration
    }

    /// Parser seeded with the configured attributes.
    pub fn parser(&self) -> Parser {
        Parser::new()
            .with_attributes(self.attributes.clone())
            .with_max_include_depth(self.parser_resolved.max_include_depth)
    }

    /// Filesystem resolver rooted at `parser.base_dir`.
    pub fn content_resolver(&self) -> FsContentResolver {
        FsContentResolver::new(&self.parser_resolved.base_dir)
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let expander = EnvExpander::process();
        if let Some(ref base_dir) = self.parser.base_dir {
            self.parser.base_dir = Some(expander.expand(base_dir, "parser.base_dir")?);
        }
        if let Some(ref assets_base) = self.render.assets_base {
            self.render.assets_base = Some(expander.expand(assets_base, "render.assets_base")?);
        }
        for (name, value) in &mut self.attributes {
            *value = expander.expand(value, &format!("attributes.{name}"))?;
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory and apply defaults.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.parser_resolved = ParserConfig {
            base_dir: config_dir.join(self.parser.base_dir.as_deref().unwrap_or(".")),
            max_include_depth: self
                .parser
                .max_include_depth
                .unwrap_or(DEFAULT_MAX_INCLUDE_DEPTH),
        };

        let defaults = RenderConfig::default();
        self.render_resolved = RenderConfig {
            assets_base: self.render.assets_base.as_deref().map(|p| config_dir.join(p)),
            section_tag: self
                .render
                .section_tag
                .clone()
                .unwrap_or(defaults.section_tag),
            support_data_attributes: self
                .render
                .support_data_attributes
                .unwrap_or(defaults.support_data_attributes),
            skip_section_body: self
                .render
                .skip_section_body
                .unwrap_or(defaults.skip_section_body),
            skip_global_content_wrapper: self
                .render
                .skip_global_content_wrapper
                .unwrap_or(defaults.skip_global_content_wrapper),
        };
    }
}
