use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    pub profile: Option<String>,
    pub profiles: HashMap<String, Profile>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub vault_root: String,
    /// Where bare attachment names are looked up first. Relative paths are
    /// anchored at vault_root.
    #[serde(default = "default_attachments_dir")]
    pub attachments_dir: String,
    /// Folders to exclude from store scans (relative to vault_root).
    /// These folders and their contents are never searched or exported.
    #[serde(default)]
    pub excluded_folders: Vec<String>,
    /// Extension appended to extensionless link targets (default: md).
    #[serde(default = "default_note_extension")]
    pub note_extension: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_attachments_dir() -> String {
    "{{vault_root}}/attachments".to_string()
}

fn default_note_extension() -> String {
    "md".to_string()
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub active_profile: String,
    pub vault_root: PathBuf,
    pub attachments_dir: PathBuf,
    /// Folders to exclude from store scans (resolved to absolute paths).
    pub excluded_folders: Vec<PathBuf>,
    pub note_extension: String,
    pub logging: LoggingConfig,
}
