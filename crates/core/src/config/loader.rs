use crate::config::types::{ConfigFile, LoggingConfig, Profile, ResolvedConfig};
use shellexpand::full;
use std::path::{Path, PathBuf};
use std::{env, fs};

use dirs::home_dir;
use thiserror::Error;

/// Marker directory that identifies the root of a document store.
const STORE_MARKER: &str = ".obsidian";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at {0}")]
    NotFound(String),

    #[error("failed to read config file {0}: {1}")]
    ReadError(String, #[source] std::io::Error),

    #[error("failed to parse TOML in {0}: {1}")]
    ParseError(String, #[source] toml::de::Error),

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("no profiles defined in config")]
    NoProfiles,

    #[error("version {0} is unsupported (expected 1)")]
    BadVersion(u32),

    #[error("home directory not available to expand '~'")]
    NoHome,

    #[error("vault root does not exist: {0}")]
    VaultNotFound(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(
        config_path: Option<&Path>,
        profile_override: Option<&str>,
    ) -> Result<ResolvedConfig, ConfigError> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let s = fs::read_to_string(&path)
            .map_err(|e| ConfigError::ReadError(path.display().to_string(), e))?;

        let cf: ConfigFile = toml::from_str(&s)
            .map_err(|e| ConfigError::ParseError(path.display().to_string(), e))?;

        if cf.version != 1 {
            return Err(ConfigError::BadVersion(cf.version));
        }
        if cf.profiles.is_empty() {
            return Err(ConfigError::NoProfiles);
        }

        let active = profile_override
            .map(ToOwned::to_owned)
            .or(cf.profile.clone())
            .unwrap_or_else(|| "default".to_string());

        let prof = cf
            .profiles
            .get(&active)
            .ok_or_else(|| ConfigError::ProfileNotFound(active.clone()))?;

        let resolved = Self::resolve_profile(&active, prof, &cf.logging)?;
        Ok(resolved)
    }

    /// Resolve a config from the strongest available source: an explicit
    /// vault root wins, then an explicit config file, then the default
    /// config file if one exists, and finally inference from the input
    /// path itself.
    pub fn load_or_infer(
        config_path: Option<&Path>,
        profile_override: Option<&str>,
        vault_override: Option<&Path>,
        input: &Path,
    ) -> Result<ResolvedConfig, ConfigError> {
        if vault_override.is_some() {
            return Self::infer(vault_override, input);
        }
        if config_path.is_some() {
            return Self::load(config_path, profile_override);
        }
        let default_path = default_config_path();
        if default_path.exists() {
            return Self::load(Some(&default_path), profile_override);
        }
        Self::infer(None, input)
    }

    /// Build a config without a file, rooting the store at the given
    /// override or at the nearest marked ancestor of the input.
    pub fn infer(
        vault_override: Option<&Path>,
        input: &Path,
    ) -> Result<ResolvedConfig, ConfigError> {
        let vault_root = match vault_override {
            Some(root) => root
                .canonicalize()
                .map_err(|_| ConfigError::VaultNotFound(root.display().to_string()))?,
            None => {
                let start = input.canonicalize().unwrap_or_else(|_| input.to_path_buf());
                detect_store_root(&start)
            }
        };

        Ok(ResolvedConfig {
            active_profile: "inferred".to_string(),
            attachments_dir: vault_root.join("attachments"),
            excluded_folders: Vec::new(),
            note_extension: "md".to_string(),
            logging: LoggingConfig::default(),
            vault_root,
        })
    }

    fn resolve_profile(
        active: &str,
        prof: &Profile,
        log_cfg: &LoggingConfig,
    ) -> Result<ResolvedConfig, ConfigError> {
        let vault_root = expand_path(&prof.vault_root)?;
        let sub = |s: &str| s.replace("{{vault_root}}", &vault_root.to_string_lossy());

        let attachments_dir = absolutize(&vault_root, expand_path(&sub(&prof.attachments_dir))?);

        let mut excluded_folders = Vec::with_capacity(prof.excluded_folders.len());
        for folder in &prof.excluded_folders {
            let expanded = expand_path(&sub(folder))?;
            excluded_folders.push(absolutize(&vault_root, expanded));
        }

        // Resolve log file path if present
        let logging = if let Some(ref file) = log_cfg.file {
            let expanded_file = expand_path(&sub(&file.to_string_lossy()))?;
            LoggingConfig {
                level: log_cfg.level.clone(),
                file_level: log_cfg.file_level.clone(),
                file: Some(expanded_file),
            }
        } else {
            log_cfg.clone()
        };

        Ok(ResolvedConfig {
            active_profile: active.to_string(),
            vault_root,
            attachments_dir,
            excluded_folders,
            note_extension: prof.note_extension.clone(),
            logging,
        })
    }
}

/// Walk up from the input looking for a store marker directory. Falls back
/// to the input's own directory when no ancestor carries one.
pub fn detect_store_root(input: &Path) -> PathBuf {
    let start = if input.is_dir() {
        input
    } else {
        input.parent().unwrap_or(input)
    };

    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(STORE_MARKER).is_dir() {
            return dir.to_path_buf();
        }
        current = dir.parent();
    }
    start.to_path_buf()
}

pub fn default_config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("vaultpack").join("config.toml");
    }
    let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
    home.join(".config").join("vaultpack").join("config.toml")
}

fn absolutize(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() { path } else { root.join(path) }
}

fn expand_path(input: &str) -> Result<PathBuf, ConfigError> {
    let expanded = full(input).map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(expanded.to_string()))
}
