use std::path::{Path, PathBuf};
use std::process;

use serde::Serialize;
use tracing::debug;
use vaultpack_core::config::loader::ConfigLoader;
use vaultpack_core::export::{self, ExportRequest, ExportStats};

use crate::ExportArgs;
use crate::logging;

pub fn run(config: Option<&Path>, profile: Option<&str>, args: ExportArgs) {
    let input = match args.input.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot open input {}: {e}", args.input.display());
            process::exit(1);
        }
    };

    let cfg = match ConfigLoader::load_or_infer(config, profile, args.vault.as_deref(), &input)
    {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    logging::init(&cfg);
    debug!(profile = %cfg.active_profile, store = %cfg.vault_root.display(), "running export");

    let output_root = args.output.clone().unwrap_or_else(|| default_output_dir(&input));

    let request = ExportRequest {
        input: input.clone(),
        store_root: cfg.vault_root.clone(),
        output_root: output_root.clone(),
        attachments_dir: cfg.attachments_dir.clone(),
        excluded_folders: cfg.excluded_folders.clone(),
        note_extension: cfg.note_extension.clone(),
    };

    match export::export(&request) {
        Ok(stats) => {
            if args.json {
                print_json(&input, &output_root, &stats);
            } else {
                print_summary(&output_root, &stats);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Default output directory: the seed's name (without extension for note
/// files), created in the current directory.
fn default_output_dir(input: &Path) -> PathBuf {
    let name = if input.is_dir() { input.file_name() } else { input.file_stem() };
    match name {
        Some(n) => PathBuf::from(n),
        None => PathBuf::from("export"),
    }
}

fn print_summary(output_root: &Path, stats: &ExportStats) {
    println!("OK   vpk export");
    println!("output: {}", output_root.display());
    println!(
        "notes: {} ({} rewritten), attachments: {}, duplicates skipped: {}",
        stats.notes_exported,
        stats.notes_rewritten,
        stats.attachments_exported,
        stats.duplicates_skipped
    );
    if stats.collision_renames > 0 {
        println!("collision renames: {}", stats.collision_renames);
    }
    if stats.unresolved_links > 0 {
        println!("unresolved links: {}", stats.unresolved_links);
    }
    if stats.unreadable_skipped > 0 {
        println!("unreadable files skipped: {}", stats.unreadable_skipped);
    }
    println!("took {} ms", stats.duration_ms);
}

#[derive(Serialize)]
struct JsonReport<'a> {
    input: String,
    output: String,
    #[serde(flatten)]
    stats: &'a ExportStats,
}

fn print_json(input: &Path, output_root: &Path, stats: &ExportStats) {
    let report = JsonReport {
        input: input.display().to_string(),
        output: output_root.display().to_string(),
        stats,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("Error: failed to serialize report: {e}");
            process::exit(1);
        }
    }
}
