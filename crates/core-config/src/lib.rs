//! Configuration loading and parsing.
//!
//! Parses `modal-sync.toml` (or an override path supplied by the embedder).
//! Only the `[reconcile]` table is read today; it tunes how the mode
//! reconciler treats host edits that invalidate position-dependent state.
//! Unknown fields are ignored so files can carry settings for newer versions.
//! A file that fails to parse falls back to defaults with a warning rather
//! than failing editor start-up.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "modal-sync.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Leave Visual mode when a host edit removes both ends of the selection.
    #[serde(default = "ReconcileConfig::enabled")]
    pub exit_visual_when_selection_removed: bool,
    /// Cancel a pending operator when a host edit removes the text under the caret.
    #[serde(default = "ReconcileConfig::enabled")]
    pub cancel_pending_when_caret_removed: bool,
    /// Pull a Normal-mode caret left onto the last character when an edit leaves it at line end.
    #[serde(default = "ReconcileConfig::enabled")]
    pub normalize_normal_mode_caret: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            exit_visual_when_selection_removed: true,
            cancel_pending_when_caret_removed: true,
            normalize_normal_mode_caret: true,
        }
    }
}

impl ReconcileConfig {
    const fn enabled() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("modal-sync").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file = toml::from_str::<ConfigFile>(content)?;
        Ok(Self {
            raw: Some(content.to_string()),
            file,
        })
    }

    pub fn reconcile(&self) -> &ReconcileConfig {
        &self.file.reconcile
    }
}
