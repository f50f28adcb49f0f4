//! Link-target resolution against the document store.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::vault::{StoreWalker, StoreWalkerError, WalkedFile};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("link target not found in store: {0}")]
    NotFound(String),

    #[error("failed to scan store for link targets: {0}")]
    Scan(#[from] StoreWalkerError),
}

/// Resolves normalized link targets to absolute file paths inside the store.
///
/// Resolution rules, in order:
/// 1. A bare file name is looked up in the attachments directory, then
///    anywhere in the store.
/// 2. A `./` or `../` target resolves against the referring document's
///    directory.
/// 3. Anything else resolves against the store root.
///
/// A target that normalizes to a path outside the store root does not
/// resolve; exports never reach past the store.
pub struct PathResolver {
    store_root: PathBuf,
    attachments_dir: PathBuf,
    excluded_folders: Vec<PathBuf>,
    store_index: Option<Vec<WalkedFile>>,
}

impl PathResolver {
    /// Create a resolver. `store_root` and `attachments_dir` must be
    /// absolute; the caller canonicalizes them so containment checks against
    /// walked paths compare like with like.
    pub fn new(
        store_root: PathBuf,
        attachments_dir: PathBuf,
        excluded_folders: Vec<PathBuf>,
    ) -> Self {
        Self { store_root, attachments_dir, excluded_folders, store_index: None }
    }

    /// Resolve one target, written in `referrer`, to an absolute file path.
    pub fn resolve(&mut self, referrer: &Path, target: &str) -> Result<PathBuf, ResolveError> {
        if !target.contains('/') {
            let preferred = self.attachments_dir.join(target);
            if preferred.is_file() {
                return Ok(preferred);
            }
            return self.search_store(target);
        }

        if target.starts_with("./") || target.starts_with("../") {
            let base = referrer.parent().unwrap_or(&self.store_root);
            let candidate = normalize_lexical(&base.join(target));
            if candidate.starts_with(&self.store_root) && candidate.is_file() {
                return Ok(candidate);
            }
            return Err(ResolveError::NotFound(target.to_string()));
        }

        let candidate = normalize_lexical(&self.store_root.join(target));
        if candidate.starts_with(&self.store_root) && candidate.is_file() {
            return Ok(candidate);
        }
        Err(ResolveError::NotFound(target.to_string()))
    }

    /// Search the whole store for a file with the given name.
    ///
    /// The store is scanned once and the sorted listing cached for the rest
    /// of the run. Ties on name resolve to the lexicographically first
    /// relative path, so repeated exports pick the same file.
    fn search_store(&mut self, name: &str) -> Result<PathBuf, ResolveError> {
        if self.store_index.is_none() {
            let walker = StoreWalker::with_exclusions(
                &self.store_root,
                self.excluded_folders.clone(),
            )?;
            self.store_index = Some(walker.walk()?);
        }

        let wanted = OsStr::new(name);
        self.store_index
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|f| f.absolute_path.file_name() == Some(wanted))
            .map(|f| f.absolute_path.clone())
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
/// `..` at the root is dropped rather than escaping it.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
