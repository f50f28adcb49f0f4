//! Content-addressed dedup registry and rename bookkeeping.
//!
//! Each flat output namespace (`references/`, `attachments/`) is backed by
//! one registry. Files are keyed by full content hash; a secondary index
//! from natural basename to hashes catches name collisions even after the
//! earlier holder was moved to a content-derived name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::types::ExportError;
use crate::vault::{SHORT_HASH_LEN, content_hash};

/// Mapping from an original link-target basename (or a name the registry
/// chose earlier) to the final output path, relative to the output root
/// with forward slashes.
#[derive(Debug, Default)]
pub struct RenameTable {
    entries: BTreeMap<String, String>,
}

impl RenameTable {
    /// Record a mapping unless the key is already claimed. First write wins;
    /// a later file that happens to share the basename does not steal links
    /// recorded for an earlier one.
    pub fn record(&mut self, key: &str, output_path: &str) {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| output_path.to_string());
    }

    /// Re-point a mapping after its file was moved to a content-derived
    /// name. Only a mapping whose current value is `old_path` is updated; a
    /// key owned by some other entry is left alone.
    pub fn reassign(&mut self, key: &str, old_path: &str, new_path: &str) {
        match self.entries.get_mut(key) {
            Some(value) if value == old_path => *value = new_path.to_string(),
            Some(_) => {}
            None => {
                self.entries.insert(key.to_string(), new_path.to_string());
            }
        }
    }

    /// Final output path for a link-target basename.
    ///
    /// Follows at most one extra hop: a link can map onto a file that was
    /// itself renamed later (its content matched a file whose name was then
    /// taken by a collision). Names the registry chose are never renamed
    /// again, so one hop always reaches the final path.
    pub fn resolve(&self, basename: &str) -> Option<&str> {
        let first = self.entries.get(basename)?;
        let hop_key = file_name_of(first);
        if hop_key != basename
            && let Some(second) = self.entries.get(hop_key)
            && second != first
        {
            return Some(second);
        }
        Some(first)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of offering a source file to a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDecision {
    /// Identical content already present; nothing copied
    Duplicate { output_path: String },
    /// Copied under its natural basename
    Copied { output_path: String },
    /// Basename collision: copied under a content-derived unique name
    CopiedUnique { output_path: String, renamed_existing: bool },
    /// Source could not be read; warned and skipped
    SkippedUnreadable,
}

/// One exported file tracked by a registry
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Path relative to the output root, forward slashes
    pub output_path: String,
    /// Natural basename the source carried
    pub basename: String,
    /// Link target that first caused the export
    pub original_ref: String,
    /// Seed-subtree notes keep their location and never collide or rename
    pub in_place: bool,
}

/// Content-addressed registry for one flat output namespace.
#[derive(Debug)]
pub struct DedupRegistry {
    output_root: PathBuf,
    subdir: String,
    by_hash: BTreeMap<String, RegistryEntry>,
    by_basename: BTreeMap<String, Vec<String>>,
}

impl DedupRegistry {
    pub fn new(output_root: PathBuf, subdir: &str) -> Self {
        Self {
            output_root,
            subdir: subdir.to_string(),
            by_hash: BTreeMap::new(),
            by_basename: BTreeMap::new(),
        }
    }

    /// Record a file that already sits inside the output tree (a seed note).
    ///
    /// The file joins content dedup, so a reference elsewhere in the graph
    /// with identical content reuses it, but it keeps its location and its
    /// name: in-place entries never participate in basename collisions.
    pub fn register_in_place(
        &mut self,
        renames: &mut RenameTable,
        relative_path: &str,
        bytes: &[u8],
    ) {
        let basename = file_name_of(relative_path).to_string();
        let hash = content_hash(bytes);

        renames.record(&basename, relative_path);
        self.by_hash.entry(hash).or_insert_with(|| RegistryEntry {
            output_path: relative_path.to_string(),
            basename: basename.clone(),
            original_ref: relative_path.to_string(),
            in_place: true,
        });
    }

    /// Offer a resolved source file for export.
    ///
    /// Content already present is skipped, a fresh basename is copied as-is,
    /// and a basename collision copies under `stem_<hash>.ext` after moving
    /// the current natural-name holder to its own content-derived name. The
    /// rename table is updated on every path so the rewrite pass can find
    /// the file under the basename links refer to it by.
    pub fn offer(
        &mut self,
        renames: &mut RenameTable,
        source: &Path,
        basename: &str,
        original_ref: &str,
    ) -> Result<ExportDecision, ExportError> {
        let bytes = match fs::read(source) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    source = %source.display(),
                    reference = original_ref,
                    error = %e,
                    "skipping unreadable source file"
                );
                return Ok(ExportDecision::SkippedUnreadable);
            }
        };

        let hash = content_hash(&bytes);

        if let Some(existing) = self.by_hash.get(&hash) {
            tracing::debug!(
                reference = original_ref,
                existing = %existing.output_path,
                "identical content already exported, reusing"
            );
            renames.record(basename, &existing.output_path);
            return Ok(ExportDecision::Duplicate { output_path: existing.output_path.clone() });
        }

        let colliding = self.by_basename.get(basename).cloned().unwrap_or_default();

        if colliding.is_empty() {
            let output_path = self.join_subdir(basename);
            self.copy_into(source, &output_path)?;
            self.insert_entry(hash, &output_path, basename, original_ref);
            renames.record(basename, &output_path);
            tracing::debug!(reference = original_ref, output = %output_path, "exported");
            return Ok(ExportDecision::Copied { output_path });
        }

        // Same basename, different content. If an earlier entry still holds
        // the natural name, move it to its own content-derived name first.
        let renamed_existing = self.rename_natural_holder(renames, basename, &colliding)?;

        let output_path = self.join_subdir(&unique_name(basename, &hash));
        self.copy_into(source, &output_path)?;
        self.insert_entry(hash, &output_path, basename, original_ref);
        renames.record(basename, &output_path);
        tracing::debug!(
            reference = original_ref,
            output = %output_path,
            "basename collision, exported under content-derived name"
        );
        Ok(ExportDecision::CopiedUnique { output_path, renamed_existing })
    }

    /// Every output path this registry placed, sorted. In-place entries are
    /// included.
    pub fn exported_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> =
            self.by_hash.values().map(|e| e.output_path.clone()).collect();
        paths.sort();
        paths
    }

    /// Move the entry still holding the natural basename to its
    /// content-derived name and re-point the rename table at it.
    fn rename_natural_holder(
        &mut self,
        renames: &mut RenameTable,
        basename: &str,
        colliding: &[String],
    ) -> Result<bool, ExportError> {
        let holder = colliding.iter().find(|h| {
            self.by_hash
                .get(*h)
                .is_some_and(|e| !e.in_place && file_name_of(&e.output_path) == basename)
        });

        let Some(holder_hash) = holder else {
            return Ok(false);
        };

        let old_path = match self.by_hash.get(holder_hash) {
            Some(entry) => entry.output_path.clone(),
            None => return Ok(false),
        };
        let new_path = self.join_subdir(&unique_name(basename, holder_hash));

        let from = self.output_root.join(&old_path);
        let to = self.output_root.join(&new_path);
        fs::rename(&from, &to).map_err(|e| ExportError::RenameError {
            from: from.clone(),
            to: to.clone(),
            source: e,
        })?;

        if let Some(entry) = self.by_hash.get_mut(holder_hash) {
            entry.output_path = new_path.clone();
        }
        renames.reassign(basename, &old_path, &new_path);

        tracing::info!(
            from = %old_path,
            to = %new_path,
            "moved earlier export to content-derived name after collision"
        );
        Ok(true)
    }

    fn insert_entry(&mut self, hash: String, output_path: &str, basename: &str, original_ref: &str) {
        self.by_basename
            .entry(basename.to_string())
            .or_default()
            .push(hash.clone());
        self.by_hash.insert(
            hash,
            RegistryEntry {
                output_path: output_path.to_string(),
                basename: basename.to_string(),
                original_ref: original_ref.to_string(),
                in_place: false,
            },
        );
    }

    fn copy_into(&self, source: &Path, relative_path: &str) -> Result<(), ExportError> {
        let dest = self.output_root.join(relative_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ExportError::CreateDirError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::copy(source, &dest).map_err(|e| ExportError::CopyError {
            from: source.to_path_buf(),
            to: dest.clone(),
            source: e,
        })?;
        Ok(())
    }

    fn join_subdir(&self, name: &str) -> String {
        if self.subdir.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.subdir, name)
        }
    }
}

/// Derive the content-addressed name used after a basename collision:
/// `stem_<hash-prefix>.ext`. Deterministic for identical content, so export
/// order does not change the chosen name.
fn unique_name(basename: &str, hash: &str) -> String {
    let path = Path::new(basename);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(basename);
    let suffix = &hash[..SHORT_HASH_LEN];
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{stem}_{suffix}"),
    }
}

fn file_name_of(relative_path: &str) -> &str {
    relative_path.rsplit('/').next().unwrap_or(relative_path)
}
