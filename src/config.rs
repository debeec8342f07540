// Service configuration: config.toml sections plus TV_CATALOG_* overrides

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::services::filter_query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

const APP_NAME: &str = "tv-catalog";
const CONFIG_FILENAME: &str = "config.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Server configuration
    pub server: ServerConfig,

    /// Directory paths (overrides XDG defaults)
    pub paths: PathsConfig,

    /// Connection pool sizing
    pub database: DatabaseConfig,

    /// API behaviour
    pub api: ApiConfig,

    /// Startup catalog import
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port (default: 8000)
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Override data directory (database location)
    pub data_dir: Option<PathBuf>,

    /// Override config directory
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Upper bound on pooled connections (default: 10)
    pub max_connections: u32,

    /// Seconds a request waits for a free connection (default: 5)
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Require an X-API-Key header on data routes (default: true)
    pub require_api_key: bool,

    /// Page size used when a request gives no limit (default: 50)
    pub default_page_size: u32,

    /// Largest accepted page size; larger limits are clamped (default: 100)
    pub max_page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            require_api_key: true,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// JSON file of show records loaded when the catalog is empty
    pub seed_file: Option<PathBuf>,
}

/// Where config.toml and the SQLite file live. Defaults to the platform
/// config and data dirs (`~/.config/tv-catalog`, `~/.local/share/tv-catalog`).
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Env vars win over `[paths]`, which wins over the platform dirs.
    pub fn new(config_overrides: &PathsConfig) -> Self {
        Self {
            config_dir: resolve_dir(
                "TV_CATALOG_CONFIG_DIR",
                &config_overrides.config_dir,
                dirs::config_dir(),
            ),
            data_dir: resolve_dir(
                "TV_CATALOG_DATA_DIR",
                &config_overrides.data_dir,
                dirs::data_dir(),
            ),
        }
    }

    /// Use the current directory for everything (portable mode)
    pub fn current_dir() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            config_dir: cwd.clone(),
            data_dir: cwd,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("tv_catalog.db")
    }

    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.database_path().display())
    }

    pub fn config_file_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILENAME)
    }

    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.config_dir).await?;
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    pub fn log_paths(&self) {
        tracing::info!("Configuration directory: {}", self.config_dir.display());
        tracing::info!("Data directory: {}", self.data_dir.display());
        tracing::debug!("Database path: {}", self.database_path().display());
    }
}

fn resolve_dir(env_var: &str, config_override: &Option<PathBuf>, platform: Option<PathBuf>) -> PathBuf {
    if let Ok(path) = std::env::var(env_var) {
        return PathBuf::from(path);
    }

    if let Some(ref path) = config_override {
        return path.clone();
    }

    if let Some(dir) = platform {
        return dir.join(APP_NAME);
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: AppPaths,

    pub port: u16,

    pub bind_address: String,

    pub database: DatabaseConfig,

    pub api: ApiConfig,

    /// Seed file imported into an empty catalog at startup
    pub seed_file: Option<PathBuf>,
}

impl AppConfig {
    /// Environment variables override config.toml, which overrides defaults.
    pub fn load() -> Self {
        let portable_mode = env_flag("TV_CATALOG_PORTABLE").unwrap_or(false);

        if portable_mode {
            tracing::info!("Portable mode: config and database in the working directory");
            let paths = AppPaths::current_dir();
            let mut config = Self::build(Self::load_config_file(&paths.config_dir));
            config.paths = paths;
            return config;
        }

        let config_dir = resolve_dir("TV_CATALOG_CONFIG_DIR", &None, dirs::config_dir());
        Self::build(Self::load_config_file(&config_dir))
    }

    /// A missing or unreadable file leaves every section at its default.
    fn load_config_file(config_dir: &Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        let contents = match std::fs::read_to_string(&config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} not present, using defaults", config_path.display());
                return ConfigFile::default();
            }
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", config_path.display(), e);
                return ConfigFile::default();
            }
        };

        toml::from_str(&contents)
            .map(|config| {
                tracing::info!("Configuration read from {}", config_path.display());
                config
            })
            .unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed {}: {}", config_path.display(), e);
                ConfigFile::default()
            })
    }

    /// Build configuration from config file with environment overrides
    fn build(config_file: ConfigFile) -> Self {
        let paths = AppPaths::new(&config_file.paths);

        let port = std::env::var("TV_CATALOG_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(config_file.server.port);

        let bind_address = std::env::var("TV_CATALOG_BIND_ADDRESS")
            .unwrap_or_else(|_| config_file.server.bind_address.clone());

        let mut api = config_file.api;
        if let Some(require) = env_flag("TV_CATALOG_REQUIRE_API_KEY") {
            api.require_api_key = require;
        }
        api.max_page_size = api.max_page_size.clamp(1, MAX_PAGE_SIZE);
        api.default_page_size = api.default_page_size.clamp(1, api.max_page_size);

        let seed_file = std::env::var("TV_CATALOG_SEED_FILE")
            .ok()
            .map(PathBuf::from)
            .or(config_file.import.seed_file);

        let mut database = config_file.database;
        database.max_connections = database.max_connections.max(1);

        Self {
            paths,
            port,
            bind_address,
            database,
            api,
            seed_file,
        }
    }

    /// Get the database URL, with override from DATABASE_URL env var
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.paths.database_url())
    }

    pub fn log_config(&self) {
        self.paths.log_paths();
        tracing::info!("Server listening on {}:{}", self.bind_address, self.port);
        tracing::debug!(
            "Pool: {} connections, {}s acquire timeout",
            self.database.max_connections,
            self.database.acquire_timeout_secs
        );

        if self.api.require_api_key {
            tracing::info!("API key authentication: ENABLED");
        } else {
            tracing::warn!("API key authentication: disabled");
        }

        match self.seed_file {
            Some(ref path) => tracing::info!("Seed file: {}", path.display()),
            None => tracing::debug!("No seed file configured"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::build(ConfigFile::default())
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}
