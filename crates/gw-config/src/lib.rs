//! Configuration management for gitwiki.
//!
//! Parses `gitwiki.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`]. Long-lived
//! components receive a [`ConfigHandle`], which exposes typed accessors and
//! lets the loaded values be swapped at runtime.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `application.repository`
//! - `application.proxy_path`

mod expand;
mod handle;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use handle::ConfigHandle;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override repository directory.
    pub repository: Option<PathBuf>,
    /// Override proxy path prefix.
    pub proxy_path: Option<String>,
    /// Override render cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override line-break mode.
    pub gfm_breaks: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "gitwiki.toml";

/// Extension appended to component filenames configured without one.
pub const DEFAULT_COMPONENT_EXTENSION: &str = "md";

/// Application configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository and URL settings.
    pub application: ApplicationConfig,
    /// Component file mappings and staleness interval.
    pub customizations: CustomizationsConfig,
    /// Render cache limits.
    pub cache: CacheConfig,
    /// Markdown rendering options.
    pub rendering: RenderingConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Repository and URL configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Working tree of the content repository.
    pub repository: PathBuf,
    /// Prefix prepended to every generated wiki URL (e.g. `/wiki-app`).
    pub proxy_path: String,
    /// Render soft line breaks as `<br>`.
    pub gfm_breaks: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            repository: PathBuf::from("."),
            proxy_path: String::new(),
            gfm_breaks: true,
        }
    }
}

/// Names of the special component pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentName {
    /// Auto-generated page listing.
    Index,
    /// Auto-generated navigation sidebar.
    Sidebar,
    /// Footer rendered on every page.
    Footer,
    /// Custom stylesheet.
    Style,
    /// Custom script.
    Script,
}

impl ComponentName {
    /// All component names in registry order.
    pub const ALL: [Self; 5] = [
        Self::Index,
        Self::Sidebar,
        Self::Footer,
        Self::Style,
        Self::Script,
    ];

    /// Lowercase identifier (`"index"`, `"sidebar"`, ...).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Sidebar => "sidebar",
            Self::Footer => "footer",
            Self::Style => "style",
            Self::Script => "script",
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component filename mappings (relative to the repository root).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CustomizationsConfig {
    /// Index page file.
    pub index: String,
    /// Sidebar page file.
    pub sidebar: String,
    /// Footer page file.
    pub footer: String,
    /// Custom stylesheet file.
    pub style: String,
    /// Custom script file.
    pub script: String,
    /// Seconds before a component re-checks the filesystem.
    pub staleness_secs: u64,
}

impl Default for CustomizationsConfig {
    fn default() -> Self {
        Self {
            index: "index.md".to_owned(),
            sidebar: "_sidebar.md".to_owned(),
            footer: "_footer.md".to_owned(),
            style: "_style.css".to_owned(),
            script: "_script.js".to_owned(),
            staleness_secs: 30,
        }
    }
}

impl CustomizationsConfig {
    /// Raw configured filename for a component.
    #[must_use]
    pub fn raw_file(&self, name: ComponentName) -> &str {
        match name {
            ComponentName::Index => &self.index,
            ComponentName::Sidebar => &self.sidebar,
            ComponentName::Footer => &self.footer,
            ComponentName::Style => &self.style,
            ComponentName::Script => &self.script,
        }
    }

    /// Configured filename with the default extension applied.
    ///
    /// `"_sidebar"` becomes `"_sidebar.md"`; names that already carry an
    /// extension are returned as-is.
    #[must_use]
    pub fn file_for(&self, name: ComponentName) -> String {
        let raw = self.raw_file(name).trim();
        if Path::new(raw).extension().is_some() {
            raw.to_owned()
        } else {
            format!("{raw}.{DEFAULT_COMPONENT_EXTENSION}")
        }
    }
}

/// Render cache configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether rendered pages are cached at all.
    pub enabled: bool,
    /// Total byte budget for rendered pages.
    pub capacity: usize,
    /// Seconds a rendered page stays fresh.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 100 * 1024 * 50,
            ttl_secs: 60 * 60,
        }
    }
}

/// Markdown rendering configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// CSS class stamped on `<<arrow<<` spans.
    pub arrow_class: String,
    /// Minimum heading level that receives a permalink anchor.
    pub anchor_level: u8,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            arrow_class: "arrow".to_owned(),
            anchor_level: 2,
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
        /// Config field path (e.g., "`application.repository`").
        field: String,
        /// Error message (e.g., "${`WIKI_ROOT`} environment variable not found").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `gitwiki.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
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
        if let Some(repository) = &settings.repository {
            self.application.repository.clone_from(repository);
        }
        if let Some(proxy_path) = &settings.proxy_path {
            self.application.proxy_path.clone_from(proxy_path);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache.enabled = cache_enabled;
        }
        if let Some(gfm_breaks) = settings.gfm_breaks {
            self.application.gfm_breaks = gfm_breaks;
        }
    }

    /// Search for config file in current directory and parents.
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

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with the repository rooted at `base`.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        Self {
            application: ApplicationConfig {
                repository: base.to_path_buf(),
                ..ApplicationConfig::default()
            },
            customizations: CustomizationsConfig::default(),
            cache: CacheConfig::default(),
            rendering: RenderingConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_application()?;
        self.validate_customizations()?;
        self.validate_cache()?;
        Ok(())
    }

    fn validate_application(&self) -> Result<(), ConfigError> {
        let proxy = &self.application.proxy_path;
        if !proxy.is_empty() && !proxy.starts_with('/') {
            return Err(ConfigError::Validation(
                "application.proxy_path must be empty or start with /".to_owned(),
            ));
        }
        if proxy.len() > 1 && proxy.ends_with('/') {
            return Err(ConfigError::Validation(
                "application.proxy_path must not end with /".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_customizations(&self) -> Result<(), ConfigError> {
        for name in ComponentName::ALL {
            require_non_empty(
                self.customizations.raw_file(name),
                &format!("customizations.{name}"),
            )?;
        }
        Ok(())
    }

    fn validate_cache(&self) -> Result<(), ConfigError> {
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(ConfigError::Validation(
                "cache.capacity must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let repository = self.application.repository.to_string_lossy().into_owned();
        self.application.repository =
            PathBuf::from(expand::expand_env(&repository, "application.repository")?);
        self.application.proxy_path =
            expand::expand_env(&self.application.proxy_path, "application.proxy_path")?;
        Ok(())
    }

    /// Resolve a relative repository path against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        if self.application.repository.is_relative() {
            self.application.repository = config_dir.join(&self.application.repository);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/srv/wiki"));
        assert_eq!(config.application.repository, PathBuf::from("/srv/wiki"));
        assert_eq!(config.application.proxy_path, "");
        assert!(config.application.gfm_breaks);
        assert_eq!(config.customizations.index, "index.md");
        assert_eq!(config.customizations.staleness_secs, 30);
        assert_eq!(config.cache.capacity, 5_120_000);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.rendering.arrow_class, "arrow");
        assert_eq!(config.rendering.anchor_level, 2);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.customizations.sidebar, "_sidebar.md");
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[application]
repository = "content"
proxy_path = "/wiki-app"
gfm_breaks = false

[customizations]
index = "Home"
sidebar = "nav.md"
staleness_secs = 5

[cache]
capacity = 1024
ttl_secs = 10

[rendering]
arrow_class = "hint"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.application.repository, PathBuf::from("content"));
        assert_eq!(config.application.proxy_path, "/wiki-app");
        assert!(!config.application.gfm_breaks);
        assert_eq!(config.customizations.index, "Home");
        assert_eq!(config.customizations.footer, "_footer.md");
        assert_eq!(config.customizations.staleness_secs, 5);
        assert_eq!(config.cache.capacity, 1024);
        assert_eq!(config.rendering.arrow_class, "hint");
    }

    #[test]
    fn test_file_for_appends_default_extension() {
        let customizations = CustomizationsConfig {
            index: "Home".to_owned(),
            ..CustomizationsConfig::default()
        };
        assert_eq!(customizations.file_for(ComponentName::Index), "Home.md");
        assert_eq!(
            customizations.file_for(ComponentName::Style),
            "_style.css"
        );
    }

    #[test]
    fn test_resolve_relative_repository() {
        let mut config: Config = toml::from_str("[application]\nrepository = \"content\"").unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(
            config.application.repository,
            PathBuf::from("/project/content")
        );
    }

    #[test]
    fn test_resolve_absolute_repository_unchanged() {
        let mut config: Config = toml::from_str("[application]\nrepository = \"/data\"").unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(config.application.repository, PathBuf::from("/data"));
    }

    #[test]
    fn test_validate_proxy_path() {
        let mut config = Config::default_with_base(Path::new("/w"));
        config.application.proxy_path = "wiki".to_owned();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("proxy_path"));

        config.application.proxy_path = "/wiki/".to_owned();
        assert!(config.validate().is_err());

        config.application.proxy_path = "/wiki".to_owned();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_component_file() {
        let mut config = Config::default_with_base(Path::new("/w"));
        config.customizations.footer = "  ".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("customizations.footer"));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let mut config = Config::default_with_base(Path::new("/w"));
        config.cache.capacity = 0;
        assert!(config.validate().is_err());

        config.cache.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/w"));
        let overrides = CliSettings {
            repository: Some(PathBuf::from("/other")),
            gfm_breaks: Some(false),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.application.repository, PathBuf::from("/other"));
        assert!(!config.application.gfm_breaks);
        assert_eq!(config.application.proxy_path, "");
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[application]\nrepository = \"pages\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.application.repository, dir.path().join("pages"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_component_name_display() {
        let names: Vec<String> = ComponentName::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["index", "sidebar", "footer", "style", "script"]);
    }
}
