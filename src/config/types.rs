// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Storage configuration
///
/// When `dir` is unset the downloads directory is derived from `$HOME`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub dir: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format: "combined", "common", "json", or a custom pattern
    pub access_log_format: String,
    /// Access log file path (None = stdout)
    pub access_log_file: Option<String>,
    /// Error log file path (None = stderr)
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Whole-connection timeout in seconds, 0 disables it
    pub connection_timeout: u64,
    pub max_connections: Option<u64>,
}
