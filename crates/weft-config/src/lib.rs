//! Configuration management for weft.
//!
//! Parses `weft.toml` configuration files with serde and provides
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
//! - `server.host`
//! - `project.source_dir`
//! - `project.out_dir`
//! - `sprite.icons_dir`
//! - `sprite.output`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override project source directory.
    pub source_dir: Option<PathBuf>,
    /// Override build output directory.
    pub out_dir: Option<PathBuf>,
    /// Override development sprite output path.
    pub sprite_output: Option<PathBuf>,
    /// Override live reload enabled flag.
    pub live_reload_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "weft.toml";

/// Project data directory name, relative to the config file.
const PROJECT_DIR: &str = ".weft";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Development server configuration.
    pub server: ServerConfig,
    /// Project layout (paths are relative strings from TOML).
    project: ProjectConfigRaw,
    /// Sprite configuration (paths are relative strings from TOML).
    sprite: SpriteConfigRaw,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,

    /// Resolved project configuration (set after loading).
    #[serde(skip)]
    pub project_resolved: ProjectConfig,
    /// Resolved sprite configuration (set after loading).
    #[serde(skip)]
    pub sprite_resolved: SpriteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Development server configuration.
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
            port: 5173,
        }
    }
}

/// Raw project configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProjectConfigRaw {
    source_dir: Option<String>,
    components_dir: Option<String>,
    out_dir: Option<String>,
}

/// Resolved project layout with absolute paths.
#[derive(Debug, Default)]
pub struct ProjectConfig {
    /// Project source root (pages, partials, `@components/` alias root).
    pub source_dir: PathBuf,
    /// Component directory name, relative to `source_dir`.
    pub components_dir: String,
    /// Production build output directory.
    pub out_dir: PathBuf,
    /// Project data directory (.weft/).
    pub project_dir: PathBuf,
}

impl ProjectConfig {
    /// Absolute component directory.
    #[must_use]
    pub fn components_root(&self) -> PathBuf {
        self.source_dir.join(&self.components_dir)
    }
}

/// Raw sprite configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SpriteConfigRaw {
    icons_dir: Option<String>,
    output: Option<String>,
    url_path: Option<String>,
    strip_attributes: Option<Vec<String>>,
}

/// Resolved sprite configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SpriteConfig {
    /// Directory scanned for `.svg` icons.
    pub icons_dir: PathBuf,
    /// Sprite output path used by the development server.
    pub output: PathBuf,
    /// URL path pages use to reference the sprite (e.g. `/sprite.svg`).
    pub url_path: String,
    /// Attributes stripped from every icon.
    pub strip_attributes: Vec<String>,
}

impl SpriteConfig {
    /// Sprite location inside a build output directory.
    #[must_use]
    pub fn build_output(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(self.url_path.trim_start_matches('/'))
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Whether live reload is enabled.
    pub enabled: bool,
    /// File patterns (relative to the source directory) that trigger a page reload.
    pub watch_patterns: Option<Vec<String>>,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            watch_patterns: None,
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
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`WEFT_HOST`} not set").
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
    /// Otherwise, searches for `weft.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged
    /// result is validated again.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or a CLI override fails validation.
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
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(source_dir) = &settings.source_dir {
            self.project_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(out_dir) = &settings.out_dir {
            self.project_resolved.out_dir.clone_from(out_dir);
        }
        if let Some(sprite_output) = &settings.sprite_output {
            self.sprite_resolved.output.clone_from(sprite_output);
        }
        if let Some(live_reload_enabled) = settings.live_reload_enabled {
            self.live_reload.enabled = live_reload_enabled;
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

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            server: ServerConfig::default(),
            project: ProjectConfigRaw::default(),
            sprite: SpriteConfigRaw::default(),
            live_reload: LiveReloadConfig::default(),
            project_resolved: ProjectConfig::default(),
            sprite_resolved: SpriteConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        // A bare file name (e.g. `--config weft.toml`) has an empty parent
        let config_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::path::absolute(parent)?,
            _ => std::env::current_dir()?,
        };
        config.resolve_paths(&config_dir);
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
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_project()?;
        self.validate_sprite()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_project(&self) -> Result<(), ConfigError> {
        let components_dir = &self.project_resolved.components_dir;
        require_non_empty(components_dir, "project.components_dir")?;
        if Path::new(components_dir).is_absolute() {
            return Err(ConfigError::Validation(
                "project.components_dir must be relative to project.source_dir".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_sprite(&self) -> Result<(), ConfigError> {
        let url_path = &self.sprite_resolved.url_path;
        if !url_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "sprite.url_path must start with /".to_owned(),
            ));
        }
        if !url_path.ends_with(".svg") {
            return Err(ConfigError::Validation(
                "sprite.url_path must end with .svg".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        let expand_opt = |value: &mut Option<String>, field: &str| -> Result<(), ConfigError> {
            if let Some(raw) = value.as_deref() {
                *value = Some(expand::expand_env(raw, field)?);
            }
            Ok(())
        };

        expand_opt(&mut self.project.source_dir, "project.source_dir")?;
        expand_opt(&mut self.project.out_dir, "project.out_dir")?;
        expand_opt(&mut self.sprite.icons_dir, "sprite.icons_dir")?;
        expand_opt(&mut self.sprite.output, "sprite.output")?;

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let project_dir = config_dir.join(PROJECT_DIR);

        self.project_resolved = ProjectConfig {
            source_dir: resolve(self.project.source_dir.as_deref(), "src"),
            components_dir: self
                .project
                .components_dir
                .clone()
                .unwrap_or_else(|| "components".to_owned()),
            out_dir: resolve(self.project.out_dir.as_deref(), "dist"),
            project_dir: project_dir.clone(),
        };

        self.sprite_resolved = SpriteConfig {
            icons_dir: resolve(self.sprite.icons_dir.as_deref(), "src/icons"),
            output: self
                .sprite
                .output
                .as_deref()
                .map_or_else(|| project_dir.join("sprite.svg"), |p| config_dir.join(p)),
            url_path: self
                .sprite
                .url_path
                .clone()
                .unwrap_or_else(|| "/sprite.svg".to_owned()),
            strip_attributes: self
                .sprite
                .strip_attributes
                .clone()
                .unwrap_or_else(|| vec!["data-name".to_owned()]),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5173);
        assert_eq!(config.project_resolved.source_dir, PathBuf::from("/test/src"));
        assert_eq!(config.project_resolved.out_dir, PathBuf::from("/test/dist"));
        assert_eq!(
            config.project_resolved.project_dir,
            PathBuf::from("/test/.weft")
        );
        assert_eq!(
            config.project_resolved.components_root(),
            PathBuf::from("/test/src/components")
        );
        assert_eq!(
            config.sprite_resolved.icons_dir,
            PathBuf::from("/test/src/icons")
        );
        assert_eq!(
            config.sprite_resolved.output,
            PathBuf::from("/test/.weft/sprite.svg")
        );
        assert_eq!(config.sprite_resolved.url_path, "/sprite.svg");
        assert_eq!(config.sprite_resolved.strip_attributes, vec!["data-name"]);
        assert!(config.live_reload.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5173);
    }

    #[test]
    fn test_parse_server_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_parse_live_reload_config() {
        let toml = r#"
[live_reload]
enabled = false
watch_patterns = ["**/*.html", "**/*.css"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.live_reload.enabled);
        assert_eq!(
            config.live_reload.watch_patterns,
            Some(vec!["**/*.html".to_owned(), "**/*.css".to_owned()])
        );
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[project]
source_dir = "site"
components_dir = "partials"
out_dir = "public"

[sprite]
icons_dir = "assets/icons"
output = "site/generated/icons.svg"
url_path = "/assets/icons.svg"
strip_attributes = ["data-name", "id"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.project_resolved.source_dir,
            PathBuf::from("/project/site")
        );
        assert_eq!(
            config.project_resolved.components_root(),
            PathBuf::from("/project/site/partials")
        );
        assert_eq!(
            config.project_resolved.out_dir,
            PathBuf::from("/project/public")
        );
        assert_eq!(
            config.sprite_resolved.icons_dir,
            PathBuf::from("/project/assets/icons")
        );
        assert_eq!(
            config.sprite_resolved.output,
            PathBuf::from("/project/site/generated/icons.svg")
        );
        assert_eq!(
            config.sprite_resolved.build_output(&config.project_resolved.out_dir),
            PathBuf::from("/project/public/assets/icons.svg")
        );
        assert_eq!(
            config.sprite_resolved.strip_attributes,
            vec!["data-name".to_owned(), "id".to_owned()]
        );
    }

    #[test]
    fn test_validate_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_validate_empty_host() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = String::new();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_validate_url_path_requires_leading_slash() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.sprite_resolved.url_path = "sprite.svg".to_owned();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("sprite.url_path"));
    }

    #[test]
    fn test_validate_url_path_requires_svg() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.sprite_resolved.url_path = "/sprite.png".to_owned();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_absolute_components_dir() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.project_resolved.components_dir = "/abs/components".to_owned();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("project.components_dir"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            port: Some(8080),
            out_dir: Some(PathBuf::from("/tmp/out")),
            live_reload_enabled: Some(false),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1"); // Unchanged
        assert_eq!(config.project_resolved.out_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.project_resolved.source_dir, PathBuf::from("/test/src")); // Unchanged
        assert!(!config.live_reload.enabled);
    }

    #[test]
    fn test_apply_cli_settings_sprite_output() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            sprite_output: Some(PathBuf::from("/tmp/sprite.svg")),
            source_dir: Some(PathBuf::from("/other/src")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(
            config.sprite_resolved.output,
            PathBuf::from("/tmp/sprite.svg")
        );
        assert_eq!(
            config.project_resolved.source_dir,
            PathBuf::from("/other/src")
        );
    }

    #[test]
    fn test_load_rejects_invalid_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[server]\nport = 4000\n").unwrap();
        let zero_port = CliSettings {
            port: Some(0),
            ..Default::default()
        };
        let empty_host = CliSettings {
            host: Some(String::new()),
            ..Default::default()
        };

        let port_err = Config::load(Some(&path), Some(&zero_port)).unwrap_err();
        let host_err = Config::load(Some(&path), Some(&empty_host)).unwrap_err();

        assert!(matches!(port_err, ConfigError::Validation(msg) if msg.contains("server.port")));
        assert!(matches!(host_err, ConfigError::Validation(msg) if msg.contains("server.host")));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[server]\nport = 4000\n\n[project]\nsource_dir = \"web\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.project_resolved.source_dir, dir.path().join("web"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/weft.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_applies_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[sprite]\nurl_path = \"icons\"\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_expands_env_vars() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("WEFT_TEST_OUT", "build/site");
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[project]\nout_dir = \"${WEFT_TEST_OUT}\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        unsafe {
            std::env::remove_var("WEFT_TEST_OUT");
        }

        assert_eq!(config.project_resolved.out_dir, dir.path().join("build/site"));
    }
}
