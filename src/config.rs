use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{AnnaDlError, ConfigError};
use crate::http::BROWSER_AGENTS;
use crate::scrape::DEFAULT_BASE_URL;

type Result<T> = std::result::Result<T, AnnaDlError>;

const APP_DIR: &str = "anna-dl";
const LOCAL_CONFIG: &str = "anna-dl.toml";

/// Expand tilde (~) in paths to the actual home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub max_results: usize,
    pub timeout: u64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Unset means `~/Downloads/anna-dl`
    pub dir: Option<PathBuf>,
    pub timeout: u64, // seconds
    pub user_agent: String,
    pub rotate_user_agents: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: 10,
            timeout: 30,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: None,
            timeout: 300,
            user_agent: BROWSER_AGENTS[0].to_string(),
            rotate_user_agents: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

/// Load configuration from environment variables
fn load_env_overrides(config: Config) -> Config {
    apply_env_overrides(config, |key| env::var(key).ok())
}

fn apply_env_overrides(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(val) = var("ANNA_DL_BASE_URL") {
        config.search.base_url = val;
    }
    if let Some(val) = var("ANNA_DL_DOWNLOAD_DIR") {
        config.download.dir = Some(PathBuf::from(val));
    }
    if let Some(val) = var("ANNA_DL_MAX_RESULTS") {
        match val.parse() {
            Ok(max) => config.search.max_results = max,
            Err(_) => tracing::warn!("Ignoring invalid ANNA_DL_MAX_RESULTS: {}", val),
        }
    }
    config
}

impl Config {
    /// Get the standard config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::Invalid {
            field: "config_dir".to_string(),
            reason: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }

    /// The local `anna-dl.toml` if present, else the standard path
    pub fn active_path() -> Result<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            Ok(local_config)
        } else {
            Self::config_path()
        }
    }

    /// Load configuration from local or standard location, creating a sample on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::active_path()?;

        if !config_path.exists() {
            tracing::debug!(
                "Config file not found, creating default at: {}",
                config_path.display()
            );
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Self::create_sample(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Parse `path`, then apply environment overrides and validate
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = load_env_overrides(Self::read_file(path)?).normalized();
        config.validate()?;
        Ok(config)
    }

    /// Parse `path` as-is, without environment overrides
    pub fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()).into(),
            _ => AnnaDlError::Io(e),
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config: {}", e)).into())
    }

    /// Expand tilde in paths
    fn normalized(mut self) -> Self {
        self.download.dir = self.download.dir.as_deref().map(expand_tilde);
        self.logging.file = self.logging.file.as_deref().map(expand_tilde);
        self
    }

    /// Write the configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create a sample configuration file
    pub fn create_sample<P: AsRef<Path>>(path: P) -> Result<()> {
        let sample = Self::default();
        let content = toml::to_string_pretty(&sample)
            .map_err(|e| ConfigError::ParseError(format!("Failed to serialize config: {}", e)))?;

        let commented_content = format!(
            r#"# anna-dl Configuration File
#
# Some settings can be overridden via environment variables with the ANNA_DL_ prefix:
# ANNA_DL_BASE_URL, ANNA_DL_DOWNLOAD_DIR, ANNA_DL_MAX_RESULTS

{}
# [search]
# base_url     - Catalog origin used for searches and relative result links
# max_results  - Results listed per search
# timeout      - Search and detail page timeout in seconds
#
# [download]
# dir                - Where to save downloads (default: ~/Downloads/anna-dl)
# timeout            - Download timeout in seconds
# user_agent         - User-Agent header sent with every request
# rotate_user_agents - Cycle through built-in browser agents instead
#
# [logging]
# level - error, warn, info, debug or trace
# file  - Append logs to this file instead of stderr
"#,
            content
        );

        std::fs::write(path, commented_content)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.search.base_url.starts_with("http://") || self.search.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "search.base_url".to_string(),
                reason: format!("Must be an http(s) URL, got {:?}", self.search.base_url),
            }
            .into());
        }

        if self.search.max_results == 0 {
            return Err(ConfigError::Invalid {
                field: "search.max_results".to_string(),
                reason: "Must be at least 1".to_string(),
            }
            .into());
        }

        for (field, timeout) in [
            ("search.timeout", self.search.timeout),
            ("download.timeout", self.download.timeout),
        ] {
            if timeout == 0 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: "Must be at least 1 second".to_string(),
                }
                .into());
            }
        }

        if let Some(dir) = &self.download.dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidPath {
                    path: dir.clone(),
                    reason: "Download directory not specified".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Resolve the download directory: `cli` first, then the config, then `~/Downloads/anna-dl`
    pub fn download_dir(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(expand_tilde)
            .or_else(|| self.download.dir.clone())
            .unwrap_or_else(default_download_dir)
    }

    /// Make `path` absolute and store it as the download directory
    pub fn set_download_path(&mut self, path: &Path) -> Result<PathBuf> {
        let path = expand_tilde(path);
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidPath {
                path,
                reason: "Download directory not specified".to_string(),
            }
            .into());
        }

        let absolute = if path.is_absolute() {
            path
        } else {
            env::current_dir()?.join(path)
        };
        self.download.dir = Some(absolute.clone());
        Ok(absolute)
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.download_dir {
            self.download.dir = Some(expand_tilde(&dir));
        }
        if let Some(max_results) = overrides.max_results {
            self.search.max_results = max_results;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(file) = overrides.log_file {
            self.logging.file = Some(expand_tilde(&file));
        }
    }
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Command-line configuration overrides
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub download_dir: Option<PathBuf>,
    pub max_results: Option<usize>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.search.timeout, 30);
        assert_eq!(config.download.timeout, 300);
        assert!(config.download.dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::parse("[search]\nmax_results = 25\n").unwrap();
        assert_eq!(config.search.max_results, 25);
        assert_eq!(config.search.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.download.timeout, 300);
    }

    #[test]
    fn test_parse_error() {
        let err = Config::parse("[search\nmax_results = ").unwrap_err();
        assert!(matches!(err, AnnaDlError::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.search.base_url = "ftp://annas-archive.org".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.search.max_results = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.download.timeout = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.download.dir = Some(PathBuf::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env_overrides(Config::default(), |key| match key {
            "ANNA_DL_BASE_URL" => Some("https://mirror.example.org".to_string()),
            "ANNA_DL_DOWNLOAD_DIR" => Some("/srv/books".to_string()),
            "ANNA_DL_MAX_RESULTS" => Some("not a number".to_string()),
            _ => None,
        });
        assert_eq!(config.search.base_url, "https://mirror.example.org");
        assert_eq!(config.download.dir, Some(PathBuf::from("/srv/books")));
        assert_eq!(config.search.max_results, 10);
    }

    #[test]
    fn test_download_dir_precedence() {
        let mut config = Config::default();
        assert!(config.download_dir(None).ends_with("anna-dl"));

        config.download.dir = Some(PathBuf::from("/from/config"));
        assert_eq!(config.download_dir(None), PathBuf::from("/from/config"));
        assert_eq!(
            config.download_dir(Some(Path::new("/from/cli"))),
            PathBuf::from("/from/cli")
        );
    }

    #[test]
    fn test_set_download_path_is_absolute_and_persists() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.toml");

        let mut config = Config::default();
        let stored = config.set_download_path(Path::new("relative/books")).unwrap();
        assert!(stored.is_absolute());
        assert!(stored.ends_with("relative/books"));

        config.save(&file).unwrap();
        let reloaded = Config::parse(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(reloaded.download.dir, Some(stored));
    }

    #[test]
    fn test_sample_config_parses() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("config.toml");
        Config::create_sample(&file).unwrap();

        let config = Config::parse(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(config.search.max_results, 10);
        assert!(config.download.dir.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/anna-dl/config.toml")).unwrap_err();
        assert!(matches!(err, AnnaDlError::Config(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            download_dir: Some(PathBuf::from("/tmp/books")),
            max_results: Some(3),
            log_level: Some("debug".to_string()),
            log_file: None,
        });
        assert_eq!(config.download.dir, Some(PathBuf::from("/tmp/books")));
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.logging.level, "debug");
    }
}
