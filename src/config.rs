//! Configuration types for media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};
use utoipa::ToSchema;

/// Environment variable overriding [`StorageConfig::storage_dir`]
pub const ENV_STORAGE_DIR: &str = "MEDIA_DL_STORAGE_DIR";
/// Environment variable overriding [`ApiConfig::bind_address`]
pub const ENV_BIND_ADDRESS: &str = "MEDIA_DL_BIND_ADDRESS";
/// Environment variable overriding [`ToolsConfig::ytdlp_path`]
pub const ENV_YTDLP_PATH: &str = "MEDIA_DL_YTDLP_PATH";

/// Storage root configuration
///
/// The storage root is a single flat directory holding every completed artifact.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Directory that receives downloaded files (default: "./downloads")
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
        }
    }
}

/// External fetch tool configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Arguments placed before the generated ones on every invocation
    ///
    /// Useful for things like `--cookies <file>` or a proxy setting.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Wall-clock bound for the metadata probe used by URL validation (default: 15 seconds)
    #[serde(default = "default_validation_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub validation_timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
            extra_args: Vec::new(),
            validation_timeout: default_validation_timeout(),
        }
    }
}

impl ToolsConfig {
    /// Resolve the executable to launch
    ///
    /// An explicit `ytdlp_path` always wins. Otherwise PATH is searched (when
    /// enabled) and the bare program name is used as a last resort, in which case
    /// a missing binary surfaces as a spawn error on first use.
    pub fn resolve_binary(&self) -> PathBuf {
        if let Some(path) = &self.ytdlp_path {
            return path.clone();
        }

        if self.search_path {
            match which::which(DEFAULT_TOOL_NAME) {
                Ok(path) => return path,
                Err(e) => {
                    tracing::warn!(error = %e, "yt-dlp not found in PATH");
                }
            }
        }

        PathBuf::from(DEFAULT_TOOL_NAME)
    }
}

/// Program name looked up in PATH when no explicit tool path is configured
pub const DEFAULT_TOOL_NAME: &str = "yt-dlp";

/// Main configuration for MediaDownloader
///
/// Fields are organized into logical sub-configs:
/// - [`storage`](StorageConfig) - the storage root
/// - [`tools`](ToolsConfig) - external binary path, arguments and probe bound
/// - [`server`](ServerIntegrationConfig) - REST API settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Storage root settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Storage root
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage.storage_dir
    }

    /// Load configuration from a JSON file
    ///
    /// Every field is optional; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read '{}': {}", path.display(), e),
            key: None,
        })?;

        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse '{}': {}", path.display(), e),
            key: None,
        })
    }

    /// Apply `MEDIA_DL_*` environment variable overrides on top of this config
    pub fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var(ENV_STORAGE_DIR) {
            self.storage.storage_dir = PathBuf::from(dir);
        }

        if let Ok(addr) = std::env::var(ENV_BIND_ADDRESS) {
            self.server.api.bind_address = addr.parse().map_err(|e| Error::Config {
                message: format!("invalid bind address '{}': {}", addr, e),
                key: Some("bind_address".to_string()),
            })?;
        }

        if let Ok(path) = std::env::var(ENV_YTDLP_PATH) {
            self.tools.ytdlp_path = Some(PathBuf::from(path));
        }

        Ok(self)
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

// Default value functions
fn default_storage_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_true() -> bool {
    true
}

fn default_validation_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();

        assert_eq!(config.storage_dir(), &PathBuf::from("downloads"));
        assert_eq!(config.tools.validation_timeout, Duration::from_secs(15));
        assert!(config.tools.search_path);
        assert!(config.tools.extra_args.is_empty());
        assert_eq!(
            config.server.api.bind_address,
            "0.0.0.0:8000".parse::<SocketAddr>().unwrap()
        );
        assert!(config.server.api.cors_enabled);
        assert!(config.server.api.swagger_ui);
    }

    #[test]
    fn empty_json_object_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.storage_dir(), &PathBuf::from("downloads"));
        assert_eq!(config.tools.validation_timeout, Duration::from_secs(15));
    }

    #[test]
    fn validation_timeout_is_expressed_in_seconds() {
        let config: Config =
            serde_json::from_str(r#"{"tools": {"validation_timeout": 3}}"#).unwrap();
        assert_eq!(config.tools.validation_timeout, Duration::from_secs(3));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["tools"]["validation_timeout"], 3);
    }

    #[test]
    fn from_file_reads_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"storage": {"storage_dir": "/data"}, "server": {"api": {"bind_address": "127.0.0.1:9000"}}}"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.storage_dir(), &PathBuf::from("/data"));
        assert_eq!(config.server.api.bind_address.port(), 9000);
        assert!(config.server.api.cors_enabled);
    }

    #[test]
    fn from_file_reports_parse_errors_as_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        match Config::from_file(&path) {
            Err(Error::Config { message, .. }) => assert!(message.contains("failed to parse")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn from_file_reports_missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/media-dl/config.json"));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    #[serial]
    fn env_overrides_replace_file_values() {
        unsafe {
            std::env::set_var(ENV_STORAGE_DIR, "/srv/media");
            std::env::set_var(ENV_BIND_ADDRESS, "127.0.0.1:7000");
            std::env::set_var(ENV_YTDLP_PATH, "/opt/yt-dlp");
        }

        let config = Config::default().apply_env_overrides();

        unsafe {
            std::env::remove_var(ENV_STORAGE_DIR);
            std::env::remove_var(ENV_BIND_ADDRESS);
            std::env::remove_var(ENV_YTDLP_PATH);
        }

        let config = config.unwrap();
        assert_eq!(config.storage_dir(), &PathBuf::from("/srv/media"));
        assert_eq!(config.server.api.bind_address.port(), 7000);
        assert_eq!(config.tools.ytdlp_path, Some(PathBuf::from("/opt/yt-dlp")));
    }

    #[test]
    #[serial]
    fn invalid_bind_address_override_is_rejected() {
        unsafe {
            std::env::set_var(ENV_BIND_ADDRESS, "not-an-address");
        }

        let result = Config::default().apply_env_overrides();

        unsafe {
            std::env::remove_var(ENV_BIND_ADDRESS);
        }

        match result {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("bind_address")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn explicit_tool_path_wins_over_search() {
        let tools = ToolsConfig {
            ytdlp_path: Some(PathBuf::from("/custom/yt-dlp")),
            ..Default::default()
        };
        assert_eq!(tools.resolve_binary(), PathBuf::from("/custom/yt-dlp"));
    }

    #[test]
    fn disabled_search_falls_back_to_program_name() {
        let tools = ToolsConfig {
            search_path: false,
            ..Default::default()
        };
        assert_eq!(tools.resolve_binary(), PathBuf::from(DEFAULT_TOOL_NAME));
    }
}
