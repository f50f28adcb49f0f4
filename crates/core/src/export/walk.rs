//! Graph walk: seed placement and reachable-subgraph export.
//!
//! Seeds are placed first (a single note at the output root, a folder with
//! its subtree preserved), then a worklist walk follows every link until no
//! new notes appear. Notes visit at most once per target string; attachments
//! rely on content dedup instead, so a second occurrence costs one hash.

use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::registry::{DedupRegistry, ExportDecision, RenameTable};
use crate::export::types::{
    ATTACHMENTS_DIR, ExportError, ExportRequest, ExportStats, REFERENCES_DIR,
};
use crate::link::{LinkKind, LinkReference, parse_links};
use crate::resolve::{PathResolver, ResolveError};
use crate::vault::{StoreWalker, StoreWalkerError, is_note_file};

/// Walks the link graph out from the seed and materializes every reachable
/// note and attachment in the output tree.
pub struct Exporter {
    input: PathBuf,
    output_root: PathBuf,
    note_extension: String,
    excluded_folders: Vec<PathBuf>,
    resolver: PathResolver,
    notes: DedupRegistry,
    attachments: DedupRegistry,
    renames: RenameTable,
    /// Normalized note targets already handled, plus seed file names.
    visited: BTreeSet<String>,
    /// Notes whose outbound links still need processing.
    queue: VecDeque<PathBuf>,
    /// Source paths of seed notes; link targets resolving here are already
    /// in the output and are never copied again.
    in_place_sources: BTreeSet<PathBuf>,
    stats: ExportStats,
}

impl Exporter {
    /// Validate the request, create the output root and set up an empty
    /// walk state. Refuses to touch an output directory that already exists.
    pub fn new(request: &ExportRequest) -> Result<Self, ExportError> {
        let input = request
            .input
            .canonicalize()
            .map_err(|_| ExportError::MissingInput(request.input.clone()))?;

        if input.is_file() && !is_note_file(&input, &request.note_extension) {
            return Err(ExportError::InvalidInput(input));
        }

        let store_root = request.store_root.canonicalize().map_err(|_| {
            StoreWalkerError::MissingRoot(request.store_root.display().to_string())
        })?;

        if !input.starts_with(&store_root) {
            tracing::warn!(
                input = %input.display(),
                store_root = %store_root.display(),
                "input lies outside the store root; relative links may not resolve"
            );
        }

        if request.output_root.exists() {
            return Err(ExportError::OutputExists(request.output_root.clone()));
        }
        fs::create_dir_all(&request.output_root).map_err(|e| ExportError::CreateDirError {
            path: request.output_root.clone(),
            source: e,
        })?;
        let output_root =
            request.output_root.canonicalize().map_err(|e| ExportError::CreateDirError {
                path: request.output_root.clone(),
                source: e,
            })?;

        // The attachments directory may simply not exist in this store;
        // lookups there will fail and fall through to the store search.
        let attachments_dir = request
            .attachments_dir
            .canonicalize()
            .unwrap_or_else(|_| request.attachments_dir.clone());

        // An output directory created inside the store must never feed the
        // store search, or the walk would rediscover its own copies.
        let mut resolver_exclusions = request.excluded_folders.clone();
        if output_root.starts_with(&store_root) {
            resolver_exclusions.push(output_root.clone());
        }

        let resolver = PathResolver::new(store_root, attachments_dir, resolver_exclusions);

        Ok(Self {
            input,
            output_root: output_root.clone(),
            note_extension: request.note_extension.clone(),
            excluded_folders: request.excluded_folders.clone(),
            resolver,
            notes: DedupRegistry::new(output_root.clone(), REFERENCES_DIR),
            attachments: DedupRegistry::new(output_root, ATTACHMENTS_DIR),
            renames: RenameTable::default(),
            visited: BTreeSet::new(),
            queue: VecDeque::new(),
            in_place_sources: BTreeSet::new(),
            stats: ExportStats::default(),
        })
    }

    /// Copy the seed into the output and queue it for link processing.
    ///
    /// A single note lands directly at the output root. A folder keeps its
    /// internal layout: every note under it is copied to the same relative
    /// path.
    pub fn place_seeds(&mut self) -> Result<(), ExportError> {
        if self.input.is_file() {
            let name = self
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "note.md".to_string());
            let dest = self.output_root.join(&name);
            copy_file(&self.input, &dest)?;
            self.register_seed(self.input.clone(), name)?;
            return Ok(());
        }

        let mut exclusions = self.excluded_folders.clone();
        if self.output_root.starts_with(&self.input) {
            exclusions.push(self.output_root.clone());
        }
        let walker = StoreWalker::with_exclusions(&self.input, exclusions)?;
        for file in walker.walk_notes(&self.note_extension)? {
            let relative = file.relative_path.to_string_lossy().into_owned();
            let dest = self.output_root.join(&file.relative_path);
            copy_file(&file.absolute_path, &dest)?;
            self.register_seed(file.absolute_path, relative)?;
        }
        Ok(())
    }

    /// Process queued notes until the worklist drains. Every note parsed
    /// here has already been placed in the output.
    pub fn walk(&mut self) -> Result<(), ExportError> {
        while let Some(source) = self.queue.pop_front() {
            self.process_note(&source)?;
        }
        Ok(())
    }

    /// Tear down the walk and hand the rewrite pass what it needs: the
    /// final paths of all exported notes and the completed rename table.
    pub fn finish(self) -> (Vec<String>, RenameTable, ExportStats) {
        (self.notes.exported_paths(), self.renames, self.stats)
    }

    fn register_seed(&mut self, source: PathBuf, relative: String) -> Result<(), ExportError> {
        let bytes = fs::read(&source).map_err(|e| ExportError::ReadError {
            path: source.clone(),
            source: e,
        })?;
        self.notes.register_in_place(&mut self.renames, &relative, &bytes);

        // Links name seeds by file name; mark that as handled so the walk
        // terminates on back-edges into the seed.
        let basename = relative.rsplit('/').next().unwrap_or(&relative);
        self.visited.insert(basename.to_string());

        self.in_place_sources.insert(source.clone());
        self.queue.push_back(source);
        self.stats.notes_exported += 1;
        Ok(())
    }

    fn process_note(&mut self, source: &Path) -> Result<(), ExportError> {
        let content = match fs::read_to_string(source) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    source = %source.display(),
                    error = %e,
                    "skipping unreadable note"
                );
                self.stats.unreadable_skipped += 1;
                return Ok(());
            }
        };

        tracing::debug!(source = %source.display(), "processing note links");
        for reference in parse_links(&content, &self.note_extension) {
            match reference.kind {
                LinkKind::Attachment => self.handle_attachment(source, &reference)?,
                LinkKind::Note => self.handle_note(source, &reference)?,
            }
        }
        Ok(())
    }

    fn handle_attachment(
        &mut self,
        referrer: &Path,
        reference: &LinkReference,
    ) -> Result<(), ExportError> {
        let Some(resolved) = self.resolve_target(referrer, &reference.target)? else {
            return Ok(());
        };

        let decision = self.attachments.offer(
            &mut self.renames,
            &resolved,
            reference.basename(),
            &reference.target,
        )?;
        self.tally(&decision, LinkKind::Attachment);
        Ok(())
    }

    fn handle_note(
        &mut self,
        referrer: &Path,
        reference: &LinkReference,
    ) -> Result<(), ExportError> {
        if !self.visited.insert(reference.target.clone()) {
            return Ok(());
        }

        let Some(resolved) = self.resolve_target(referrer, &reference.target)? else {
            return Ok(());
        };

        // Seed notes are already in the output under their own path.
        if self.in_place_sources.contains(&resolved) {
            return Ok(());
        }

        let decision = self.notes.offer(
            &mut self.renames,
            &resolved,
            reference.basename(),
            &reference.target,
        )?;

        // Only freshly copied notes contribute new links; a content
        // duplicate repeats links the walk has already seen.
        if matches!(
            decision,
            ExportDecision::Copied { .. } | ExportDecision::CopiedUnique { .. }
        ) {
            self.queue.push_back(resolved);
        }
        self.tally(&decision, LinkKind::Note);
        Ok(())
    }

    /// Resolve one target, converting a miss into a warning. Store scan
    /// failures abort the run.
    fn resolve_target(
        &mut self,
        referrer: &Path,
        target: &str,
    ) -> Result<Option<PathBuf>, ExportError> {
        match self.resolver.resolve(referrer, target) {
            Ok(path) => Ok(Some(path)),
            Err(ResolveError::NotFound(target)) => {
                tracing::warn!(
                    referrer = %referrer.display(),
                    target,
                    "unresolved link target, leaving link as written"
                );
                self.stats.unresolved_links += 1;
                Ok(None)
            }
            Err(e @ ResolveError::Scan(_)) => Err(ExportError::Resolve(e)),
        }
    }

    fn tally(&mut self, decision: &ExportDecision, kind: LinkKind) {
        match decision {
            ExportDecision::Duplicate { .. } => self.stats.duplicates_skipped += 1,
            ExportDecision::Copied { .. } => match kind {
                LinkKind::Note => self.stats.notes_exported += 1,
                LinkKind::Attachment => self.stats.attachments_exported += 1,
            },
            ExportDecision::CopiedUnique { renamed_existing, .. } => {
                match kind {
                    LinkKind::Note => self.stats.notes_exported += 1,
                    LinkKind::Attachment => self.stats.attachments_exported += 1,
                }
                self.stats.collision_renames += 1;
                if *renamed_existing {
                    self.stats.collision_renames += 1;
                }
            }
            ExportDecision::SkippedUnreadable => self.stats.unreadable_skipped += 1,
        }
    }
}

fn copy_file(source: &Path, dest: &Path) -> Result<(), ExportError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| ExportError::CreateDirError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::copy(source, dest).map_err(|e| ExportError::CopyError {
        from: source.to_path_buf(),
        to: dest.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
