//! Data structures for the export pipeline.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::resolve::ResolveError;
use crate::vault::StoreWalkerError;

/// Output subdirectory for notes pulled in from outside the seed.
pub const REFERENCES_DIR: &str = "references";

/// Output subdirectory for attachments.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// Errors that abort an export run
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("input path does not exist: {0}")]
    MissingInput(PathBuf),

    #[error("input is neither a markdown document nor a directory: {0}")]
    InvalidInput(PathBuf),

    #[error("output directory already exists: {0}")]
    OutputExists(PathBuf),

    #[error("failed to walk input: {0}")]
    Walk(#[from] StoreWalkerError),

    #[error("failed to scan store: {0}")]
    Resolve(#[source] ResolveError),

    #[error("failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {from} to {to}: {source}")]
    CopyError {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rename {from} to {to}: {source}")]
    RenameError {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDirError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Inputs for one export run. All paths are absolute; the caller resolves
/// configuration and defaults before building one of these.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Seed: a single markdown document or a directory of them.
    pub input: PathBuf,
    /// Root of the document store the seed belongs to.
    pub store_root: PathBuf,
    /// Directory to create and fill. Must not exist yet.
    pub output_root: PathBuf,
    /// Directory searched first when resolving bare attachment names.
    pub attachments_dir: PathBuf,
    /// Store folders never walked or searched.
    pub excluded_folders: Vec<PathBuf>,
    /// Extension that marks a file as a note (without the dot).
    pub note_extension: String,
}

/// Statistics from an export run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportStats {
    /// Notes placed in the output (seeds plus referenced notes)
    pub notes_exported: usize,
    /// Attachments placed in the output
    pub attachments_exported: usize,
    /// Files skipped because identical content was already exported
    pub duplicates_skipped: usize,
    /// Files placed under a content-derived name after a basename collision
    pub collision_renames: usize,
    /// Links whose target could not be resolved in the store
    pub unresolved_links: usize,
    /// Source files skipped because they could not be read
    pub unreadable_skipped: usize,
    /// Exported notes whose links were updated by the rewrite pass
    pub notes_rewritten: usize,
    /// Individual links updated by the rewrite pass
    pub links_rewritten: usize,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}
