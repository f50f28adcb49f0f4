//! Recursive document store walker.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum StoreWalkerError {
    #[error("store root does not exist: {0}")]
    MissingRoot(String),

    #[error("failed to walk store directory {0}: {1}")]
    WalkError(String, #[source] walkdir::Error),
}

/// A file discovered inside the store.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    /// Absolute path to the file.
    pub absolute_path: PathBuf,
    /// Path relative to the store root.
    pub relative_path: PathBuf,
}

/// Walker for discovering files in a document store.
#[derive(Debug)]
pub struct StoreWalker {
    root: PathBuf,
    /// Folders to exclude from walking (relative paths from the store root).
    excluded_folders: Vec<PathBuf>,
}

impl StoreWalker {
    /// Create a new walker for the given store root.
    pub fn new(root: &Path) -> Result<Self, StoreWalkerError> {
        Self::with_exclusions(root, Vec::new())
    }

    /// Create a new walker with folder exclusions.
    ///
    /// Excluded folders can be specified as:
    /// - Relative paths from the store root (e.g., "assets/generated")
    /// - Absolute paths (will be converted to relative)
    pub fn with_exclusions(
        root: &Path,
        excluded_folders: Vec<PathBuf>,
    ) -> Result<Self, StoreWalkerError> {
        let root = root
            .canonicalize()
            .map_err(|_| StoreWalkerError::MissingRoot(root.display().to_string()))?;

        // Normalize exclusions to be relative to root
        let excluded_folders = excluded_folders
            .into_iter()
            .map(|p| {
                if p.is_absolute() {
                    p.strip_prefix(&root).unwrap_or(&p).to_path_buf()
                } else {
                    p
                }
            })
            .collect();

        Ok(Self { root, excluded_folders })
    }

    /// Walk the store and return every file, documents and attachments alike.
    /// Excludes hidden directories, common non-store directories, and configured
    /// exclusions. Results are sorted by relative path.
    pub fn walk(&self) -> Result<Vec<WalkedFile>, StoreWalkerError> {
        self.walk_filtered(|_| true)
    }

    /// Walk the store and return only note documents with the given extension.
    pub fn walk_notes(&self, note_extension: &str) -> Result<Vec<WalkedFile>, StoreWalkerError> {
        self.walk_filtered(|p| is_note_file(p, note_extension))
    }

    fn walk_filtered(
        &self,
        keep: impl Fn(&Path) -> bool,
    ) -> Result<Vec<WalkedFile>, StoreWalkerError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e))
        {
            let entry = entry.map_err(|e| {
                StoreWalkerError::WalkError(self.root.display().to_string(), e)
            })?;

            let path = entry.path();
            if !path.is_file() || !keep(path) {
                continue;
            }

            let relative_path =
                path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();

            files.push(WalkedFile {
                absolute_path: path.to_path_buf(),
                relative_path,
            });
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    /// Check if an entry should be excluded from walking.
    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        // Never filter the root directory (depth 0)
        if entry.depth() == 0 {
            return false;
        }

        let name = entry.file_name().to_string_lossy();

        // Skip hidden files and directories
        if name.starts_with('.') {
            return true;
        }

        // Skip common non-store directories
        if matches!(name.as_ref(), "node_modules" | "target" | "__pycache__" | "venv") {
            return true;
        }

        // Check against configured exclusions
        if !self.excluded_folders.is_empty()
            && let Ok(relative) = entry.path().strip_prefix(&self.root)
        {
            for excluded in &self.excluded_folders {
                if relative.starts_with(excluded) {
                    return true;
                }
            }
        }

        false
    }

    /// Get the store root path.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Check whether a path names a note document with the given extension.
pub fn is_note_file(path: &Path, note_extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(note_extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_store() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::write(root.join("note1.md"), "# Note 1").unwrap();
        fs::write(root.join("note2.md"), "# Note 2").unwrap();

        fs::create_dir(root.join("subdir")).unwrap();
        fs::write(root.join("subdir/note3.md"), "# Note 3").unwrap();

        // Attachments live alongside notes
        fs::create_dir(root.join("img")).unwrap();
        fs::write(root.join("img/photo.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();

        // Hidden directory (should be skipped)
        fs::create_dir(root.join(".hidden")).unwrap();
        fs::write(root.join(".hidden/secret.md"), "# Secret").unwrap();

        dir
    }

    #[test]
    fn test_walk_finds_all_files() {
        let store = create_test_store();
        let walker = StoreWalker::new(store.path()).unwrap();
        let files = walker.walk().unwrap();

        assert_eq!(files.len(), 4);

        let paths: Vec<_> = files.iter().map(|f| f.relative_path.clone()).collect();
        assert!(paths.contains(&PathBuf::from("note1.md")));
        assert!(paths.contains(&PathBuf::from("img/photo.png")));
    }

    #[test]
    fn test_walk_notes_filters_attachments() {
        let store = create_test_store();
        let walker = StoreWalker::new(store.path()).unwrap();
        let files = walker.walk_notes("md").unwrap();

        assert_eq!(files.len(), 3);

        let paths: Vec<_> =
            files.iter().map(|f| f.relative_path.to_string_lossy().to_string()).collect();
        assert!(!paths.iter().any(|p| p.ends_with(".png")));
    }

    #[test]
    fn test_is_note_file_honors_extension() {
        assert!(is_note_file(Path::new("a/b.md"), "md"));
        assert!(is_note_file(Path::new("a/b.MD"), "md"));
        assert!(is_note_file(Path::new("b.markdown"), "markdown"));
        assert!(!is_note_file(Path::new("b.markdown"), "md"));
        assert!(!is_note_file(Path::new("photo.png"), "md"));
        assert!(!is_note_file(Path::new("no_extension"), "md"));
    }

    #[test]
    fn test_walk_skips_hidden_directories() {
        let store = create_test_store();
        let walker = StoreWalker::new(store.path()).unwrap();
        let files = walker.walk().unwrap();

        let paths: Vec<_> =
            files.iter().map(|f| f.relative_path.to_string_lossy().to_string()).collect();

        assert!(!paths.iter().any(|p| p.contains(".hidden")));
    }

    #[test]
    fn test_walk_results_sorted() {
        let store = create_test_store();
        let walker = StoreWalker::new(store.path()).unwrap();
        let files = walker.walk().unwrap();

        let paths: Vec<_> = files.iter().map(|f| &f.relative_path).collect();
        let mut sorted = paths.clone();
        sorted.sort();

        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_missing_root() {
        let result = StoreWalker::new(Path::new("/nonexistent/path"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), StoreWalkerError::MissingRoot(_)));
    }

    #[test]
    fn test_walk_with_exclusions() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::write(root.join("note1.md"), "# Note 1").unwrap();

        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("templates/task.md"), "# Task Template").unwrap();

        fs::create_dir_all(root.join("archive/old")).unwrap();
        fs::write(root.join("archive/old/past.md"), "# Past").unwrap();

        fs::create_dir_all(root.join("projects")).unwrap();
        fs::write(root.join("projects/proj.md"), "# Project").unwrap();

        // Walk without exclusions - should find all 4 files
        let walker = StoreWalker::new(root).unwrap();
        let files = walker.walk().unwrap();
        assert_eq!(files.len(), 4);

        // Walk with exclusions - should skip templates and archive
        let excluded = vec![PathBuf::from("templates"), PathBuf::from("archive")];
        let walker = StoreWalker::with_exclusions(root, excluded).unwrap();
        let files = walker.walk().unwrap();

        assert_eq!(files.len(), 2);

        let paths: Vec<_> =
            files.iter().map(|f| f.relative_path.to_string_lossy().to_string()).collect();

        assert!(paths.contains(&"note1.md".to_string()));
        assert!(paths.contains(&"projects/proj.md".to_string()));
        assert!(!paths.iter().any(|p| p.contains("templates")));
        assert!(!paths.iter().any(|p| p.contains("archive")));
    }

    #[test]
    fn test_walk_with_nested_exclusion() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("docs/internal")).unwrap();
        fs::write(root.join("docs/readme.md"), "# Docs").unwrap();
        fs::write(root.join("docs/internal/secret.md"), "# Secret").unwrap();

        fs::write(root.join("note.md"), "# Note").unwrap();

        // Exclude only docs/internal, not all of docs
        let excluded = vec![PathBuf::from("docs/internal")];
        let walker = StoreWalker::with_exclusions(root, excluded).unwrap();
        let files = walker.walk().unwrap();

        assert_eq!(files.len(), 2);

        let paths: Vec<_> =
            files.iter().map(|f| f.relative_path.to_string_lossy().to_string()).collect();

        assert!(paths.contains(&"note.md".to_string()));
        assert!(paths.contains(&"docs/readme.md".to_string()));
        assert!(!paths.iter().any(|p| p.contains("internal")));
    }
}
