//! Configuration management for quill.
//!
//! Parses `quill.toml` with serde and discovers the file in the current
//! directory or its parents. CLI flags are applied during load via
//! [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` expands to the value of VAR, errors if unset
//! - `${VAR:-default}` expands to VAR if set, otherwise uses default
//!
//! Expanded fields: `build.source_dir`, `build.output_dir`, `cards.api_url`,
//! `cards.token`.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quill_renderer::Severity;
use quill_renderer::components::{ComponentKind, ComponentRegistry};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// Disable card resolution.
    pub offline: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

const DEFAULT_SOURCE_DIR: &str = "src/content/posts";
const DEFAULT_OUTPUT_DIR: &str = "dist/posts";
const MAX_CARD_TIMEOUT_MS: u64 = 60_000;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build paths as written in TOML.
    build: BuildConfigRaw,
    pub markdown: MarkdownConfig,
    pub cards: CardsConfig,
    /// Directive name to renderer kind. A `[directives]` table replaces the
    /// defaults entirely.
    pub directives: BTreeMap<String, ComponentKind>,

    /// Resolved build paths (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
}

/// Build paths, absolute when loaded from a file.
#[derive(Debug, Default)]
pub struct BuildConfig {
    /// Directory scanned for markdown files.
    pub source_dir: PathBuf,
    /// Directory receiving rendered HTML and JSON.
    pub output_dir: PathBuf,
}

/// Markdown pipeline settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub words_per_minute: u32,
    /// Excerpt length in characters.
    pub excerpt_budget: usize,
    /// Languages rendered without line numbers.
    pub line_numbers_exempt: Vec<String>,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            words_per_minute: quill_renderer::metadata::DEFAULT_WORDS_PER_MINUTE,
            excerpt_budget: quill_renderer::metadata::DEFAULT_EXCERPT_BUDGET,
            line_numbers_exempt: vec!["shellsession".to_owned()],
        }
    }
}

/// GitHub card resolution settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CardsConfig {
    /// Whether cards are resolved at all. Disabled cards render as links.
    pub enabled: bool,
    /// GitHub REST API base URL.
    pub api_url: String,
    /// Upper bound on each lookup.
    pub timeout_ms: u64,
    /// Optional bearer token. Empty means anonymous.
    pub token: Option<String>,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://api.github.com".to_owned(),
            timeout_ms: 3000,
            token: None,
        }
    }
}

impl CardsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The token, if one is set and non-empty.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

fn default_directives() -> BTreeMap<String, ComponentKind> {
    let mut directives: BTreeMap<String, ComponentKind> = Severity::ALL
        .into_iter()
        .map(|severity| {
            (
                severity.as_str().to_owned(),
                ComponentKind::Admonition(severity),
            )
        })
        .collect();
    directives.insert("github".to_owned(), ComponentKind::GithubCard);
    directives
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
        /// Config field path (e.g., "`cards.token`").
        field: String,
        /// Error message (e.g., "${`GITHUB_TOKEN`} not set").
        message: String,
    },
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Directive names are bare identifiers: `[A-Za-z][A-Za-z0-9_-]*`.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `quill.toml` in the current directory and its parents, falling back
    /// to defaults relative to the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if parsing,
    /// expansion or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(offline) = settings.offline {
            self.cards.enabled = !offline;
        }
    }

    /// Directive registry for the renderer.
    #[must_use]
    pub fn component_registry(&self) -> ComponentRegistry {
        self.directives
            .iter()
            .map(|(name, kind)| (name.clone(), *kind))
            .collect()
    }

    /// Search for the config file in `start` and its parents.
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

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            build: BuildConfigRaw::default(),
            markdown: MarkdownConfig::default(),
            cards: CardsConfig::default(),
            directives: default_directives(),
            build_resolved: BuildConfig {
                source_dir: base.join(DEFAULT_SOURCE_DIR),
                output_dir: base.join(DEFAULT_OUTPUT_DIR),
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_markdown()?;
        self.validate_cards()?;
        self.validate_directives()?;
        Ok(())
    }

    fn validate_markdown(&self) -> Result<(), ConfigError> {
        if self.markdown.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "markdown.words_per_minute must be greater than 0".to_owned(),
            ));
        }
        if self.markdown.excerpt_budget == 0 {
            return Err(ConfigError::Validation(
                "markdown.excerpt_budget must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_cards(&self) -> Result<(), ConfigError> {
        require_http_url(&self.cards.api_url, "cards.api_url")?;
        if !(1..=MAX_CARD_TIMEOUT_MS).contains(&self.cards.timeout_ms) {
            return Err(ConfigError::Validation(format!(
                "cards.timeout_ms must be between 1 and {MAX_CARD_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }

    fn validate_directives(&self) -> Result<(), ConfigError> {
        if let Some(name) = self.directives.keys().find(|name| !is_identifier(name)) {
            return Err(ConfigError::Validation(format!(
                "directives.{name} is not a valid directive name"
            )));
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.build.source_dir {
            self.build.source_dir = Some(expand::expand_env(dir, "build.source_dir")?);
        }
        if let Some(ref dir) = self.build.output_dir {
            self.build.output_dir = Some(expand::expand_env(dir, "build.output_dir")?);
        }
        self.cards.api_url = expand::expand_env(&self.cards.api_url, "cards.api_url")?;
        if let Some(ref token) = self.cards.token {
            self.cards.token = Some(expand::expand_env(token, "cards.token")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), DEFAULT_SOURCE_DIR),
            output_dir: resolve(self.build.output_dir.as_deref(), DEFAULT_OUTPUT_DIR),
        };
    }
}
