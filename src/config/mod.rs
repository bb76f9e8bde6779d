// Configuration module entry point
// Loads layered configuration and resolves the served downloads directory

mod state;
mod types;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// Re-export public types
pub use state::AppState;
pub use types::{Config, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig};

/// Home directory used when `$HOME` is unset
const FALLBACK_HOME: &str = "/home/selenium";
const DOWNLOADS_SUBDIR: &str = "Downloads";
const ENV_PREFIX: &str = "FILESERVER";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    ///
    /// Environment overrides use `FILESERVER_<SECTION>__<KEY>`,
    /// e.g. `FILESERVER_SERVER__PORT=9090`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_layered(config_path, None)
    }

    /// `env` replaces the process environment when given
    fn load_layered(
        config_path: &str,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 0)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Directory whose contents are served, listed and deleted
    pub fn downloads_dir(&self) -> PathBuf {
        let home = std::env::var("HOME").ok();
        resolve_downloads_dir(self.storage.dir.as_deref(), home.as_deref())
    }
}

/// Resolve the downloads directory.
///
/// An explicitly configured directory wins, otherwise `<home>/Downloads`
/// with `/home/selenium` standing in for a missing or empty home.
pub fn resolve_downloads_dir(configured: Option<&str>, home: Option<&str>) -> PathBuf {
    if let Some(dir) = configured.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    let home = home.filter(|h| !h.is_empty()).unwrap_or(FALLBACK_HOME);
    Path::new(home).join(DOWNLOADS_SUBDIR)
}

/// Create the downloads directory (and parents) if it does not exist yet
pub fn prepare_downloads_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        std::io::Error::new(
            e.kind(),
            format!("failed to create downloads dir {}: {e}", dir.display()),
        )
    })
}
