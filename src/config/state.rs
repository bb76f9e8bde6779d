// Application state module
// Immutable per-process state shared by every connection task

use std::path::{Path, PathBuf};

use super::types::Config;

/// Application state
///
/// Built once at startup and shared through an `Arc`; nothing in here is
/// mutated afterwards, so request handlers never take a lock.
pub struct AppState {
    pub config: Config,
    root: PathBuf,
}

impl AppState {
    pub const fn new(config: Config, root: PathBuf) -> Self {
        Self { config, root }
    }

    /// Directory being served
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }

    pub fn access_log_format(&self) -> &str {
        &self.config.logging.access_log_format
    }
}
