use std::path::Path;

use vaultpack_core::config::loader::{ConfigLoader, default_config_path};

pub fn run(config: Option<&Path>, profile: Option<&str>) {
    match ConfigLoader::load(config, profile) {
        Ok(rc) => {
            println!("OK   vpk doctor");
            println!(
                "path: {}",
                config.map_or_else(
                    || default_config_path().display().to_string(),
                    |p| p.display().to_string()
                )
            );
            println!("profile: {}", rc.active_profile);
            println!("vault_root: {}", rc.vault_root.display());
            println!("attachments_dir: {}", rc.attachments_dir.display());
            println!("note_extension: {}", rc.note_extension);
            for folder in &rc.excluded_folders {
                println!("excluded: {}", folder.display());
            }
        }
        Err(e) => {
            println!("FAIL vpk doctor");
            println!("{e}");
            if config.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            std::process::exit(1);
        }
    }
}
