//! Subgraph export: seed placement, graph walk, dedup and link rewrite.
//!
//! An export runs in two strictly ordered phases. The walk places the seed,
//! follows every link until no new notes appear, and materializes each
//! reachable file exactly once per distinct content. Only after the
//! worklist drains does the rewrite pass touch any exported note, so a
//! rename forced by a collision discovered late is visible to links
//! discovered early.

pub mod registry;
pub mod rewrite;
pub mod types;
pub mod walk;

pub use registry::{DedupRegistry, ExportDecision, RegistryEntry, RenameTable};
pub use types::{ATTACHMENTS_DIR, ExportError, ExportRequest, ExportStats, REFERENCES_DIR};
pub use walk::Exporter;

use std::time::Instant;

/// Run a complete export: place the seed, walk the reachable link graph,
/// then rewrite links in every exported note.
pub fn export(request: &ExportRequest) -> Result<ExportStats, ExportError> {
    let start = Instant::now();

    let mut exporter = Exporter::new(request)?;
    exporter.place_seeds()?;
    exporter.walk()?;

    // The walk is complete: registries and the rename table are final.
    // Only now may any exported note be modified.
    let (documents, renames, mut stats) = exporter.finish();
    let (notes_rewritten, links_rewritten) = rewrite::rewrite_notes(
        &request.output_root,
        &documents,
        &renames,
        &request.note_extension,
    )?;

    stats.notes_rewritten = notes_rewritten;
    stats.links_rewritten = links_rewritten;
    stats.duration_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        output = %request.output_root.display(),
        notes = stats.notes_exported,
        attachments = stats.attachments_exported,
        duplicates = stats.duplicates_skipped,
        renames = stats.collision_renames,
        unresolved = stats.unresolved_links,
        duration_ms = stats.duration_ms,
        "export complete"
    );
    Ok(stats)
}
