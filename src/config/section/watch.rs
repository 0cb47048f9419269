//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! root = "target/units"     # Compiled-output directory to watch
//! ignore_temp = true        # Skip editor/compiler temp files
//! stop_poll_ms = 250        # Max delay before the watch loop notices stop
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::config::types::ConfigDiagnostics;

/// File watcher settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Compiled-output directory, relative to the config file.
    pub root: PathBuf,

    /// Skip temp/backup artifacts (`*.swp`, `*~`, dot-files).
    pub ignore_temp: bool,

    /// Upper bound on the watch loop's blocking wait, in milliseconds.
    pub stop_poll_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("target/units"),
            ignore_temp: true,
            stop_poll_ms: 250,
        }
    }
}

impl WatchConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.stop_poll_ms == 0 {
            diag.error("watch.stop_poll_ms", "must be greater than zero");
        }
        if !self.root.is_dir() {
            diag.error_with_hint(
                "watch.root",
                format!("`{}` is not a directory", self.root.display()),
                "build the application once so the compiled output exists",
            );
        }
    }
}
