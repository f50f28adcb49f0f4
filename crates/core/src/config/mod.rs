pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigLoader, default_config_path, detect_store_root};
pub use types::{ConfigFile, LoggingConfig, Profile, ResolvedConfig};
