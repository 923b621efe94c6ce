//! Configuration management for folio.
//!
//! Parses `folio.toml` with serde and discovers it in the current directory
//! or any parent. Command-line overrides are applied through [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Secret-bearing values support `${VAR}` and `${VAR:-default}`:
//!
//! - `server.host`
//! - `github.access_token`
//! - `webhook.secret`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override local content directory.
    pub source_dir: Option<PathBuf>,
    /// Override the URL prefix of generated page URLs.
    pub base_url: Option<String>,
    /// Override the cache snapshot location.
    pub cache_file: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content source configuration.
    pub source: SourceConfig,
    /// GitHub content provider (optional section).
    pub github: Option<GithubConfig>,
    /// Incremental cache configuration.
    pub cache: CacheConfig,
    /// Search index configuration.
    pub search: SearchConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Webhook configuration.
    pub webhook: WebhookConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Content source configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Local content directory.
    pub dir: PathBuf,
    /// URL prefix for generated page URLs.
    pub base_url: String,
    /// Sub-directory of the content tree to load. Empty loads everything.
    pub root_dir: String,
    /// Glob patterns selecting content files.
    pub include: Vec<String>,
    /// Configured locales. When set, page trees are built per locale.
    pub languages: Option<Vec<String>>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("content/docs"),
            base_url: "/docs".to_owned(),
            root_dir: String::new(),
            include: vec!["**/*.md".to_owned(), "**/*.mdx".to_owned(), "**/*.json".to_owned()],
            languages: None,
        }
    }
}

/// GitHub repository holding the content.
#[derive(Debug, Deserialize)]
pub struct GithubConfig {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch whose pushes trigger reconciliation.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Content directory inside the repository.
    #[serde(default = "default_directory")]
    pub directory: String,
    /// API token. Usually `${GITHUB_TOKEN}`.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl GithubConfig {
    /// Validate that the repository coordinates are set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.owner, "github.owner")?;
        require_non_empty(&self.repo, "github.repo")?;
        require_non_empty(&self.branch, "github.branch")?;
        if self.directory.starts_with("../") {
            return Err(ConfigError::Validation(
                "github.directory cannot start with '../'".to_owned(),
            ));
        }
        Ok(())
    }
}

fn default_branch() -> String {
    "main".to_owned()
}

fn default_directory() -> String {
    "content/docs".to_owned()
}

/// Incremental cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Where the cache snapshot is persisted.
    pub save_file: PathBuf,
    /// Keep built loader outputs in memory, keyed by tree sha.
    pub outputs: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            save_file: PathBuf::from(".folio/cache.json"),
            outputs: true,
        }
    }
}

/// Search index configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Index name.
    pub index: String,
    /// Facet tag attached to every record.
    pub tag: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index: "document".to_owned(),
            tag: None,
        }
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

/// Webhook configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared secret for `x-hub-signature-256` verification.
    pub secret: Option<String>,
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
        /// Config field path (e.g., "`github.access_token`").
        field: String,
        /// Error message (e.g., "${`GITHUB_TOKEN`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `folio.toml` in the current directory and its parents, falling
    /// back to defaults relative to the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, parsing
    /// fails, or the result does not validate.
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
            config.validate()?;
        }

        Ok(config)
    }

    /// Get validated GitHub configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_github(&self) -> Result<&GithubConfig, ConfigError> {
        let github = self.github.as_ref().ok_or_else(|| {
            ConfigError::Validation("[github] section required in config".into())
        })?;
        github.validate()?;
        Ok(github)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        if !self.source.base_url.is_empty() && !self.source.base_url.starts_with('/') {
            return Err(ConfigError::Validation(
                "source.base_url must start with '/'".to_owned(),
            ));
        }
        if self.source.root_dir.starts_with("../") {
            return Err(ConfigError::Validation(
                "source.root_dir cannot start with '../'".to_owned(),
            ));
        }
        require_non_empty(&self.search.index, "search.index")?;
        if let Some(github) = &self.github {
            github.validate()?;
        }
        Ok(())
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(source_dir) = &settings.source_dir {
            self.source.dir.clone_from(source_dir);
        }
        if let Some(base_url) = &settings.base_url {
            self.source.base_url.clone_from(base_url);
        }
        if let Some(cache_file) = &settings.cache_file {
            self.cache.save_file.clone_from(cache_file);
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
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

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(github) = &mut self.github
            && let Some(token) = &github.access_token
        {
            github.access_token = Some(expand::expand_env(token, "github.access_token")?);
        }

        if let Some(secret) = &self.webhook.secret {
            let secret = expand::expand_env(secret, "webhook.secret")?;
            // An empty expansion (e.g. `${SECRET:-}`) means no secret.
            self.webhook.secret = (!secret.is_empty()).then_some(secret);
        }

        Ok(())
    }

    /// Make relative paths relative to the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.source.dir = config_dir.join(&self.source.dir);
        self.cache.save_file = config_dir.join(&self.cache.save_file);
    }
}
