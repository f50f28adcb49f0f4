//! Second-pass link rewriting over exported notes.
//!
//! Runs only after the walk has fully completed: a collision late in the
//! walk renames a file that links early in the walk already point at, so
//! the rename table is not final until the worklist drains.

use std::fs;
use std::path::Path;

use crate::export::registry::RenameTable;
use crate::export::types::ExportError;
use crate::link::{LinkReference, LinkSyntax, parse_links};

/// Rewrite links in every exported note to their final output paths.
/// Returns `(notes updated, links updated)`.
///
/// A link whose basename is missing from the rename table (an unresolved
/// target) is left exactly as written.
pub fn rewrite_notes(
    output_root: &Path,
    documents: &[String],
    renames: &RenameTable,
    note_extension: &str,
) -> Result<(usize, usize), ExportError> {
    let mut notes_rewritten = 0;
    let mut links_rewritten = 0;

    for relative in documents {
        let path = output_root.join(relative);
        let content = fs::read_to_string(&path).map_err(|e| ExportError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        let references = parse_links(&content, note_extension);
        let (updated, count) = apply_rewrites(&content, &references, renames);

        if count > 0 {
            fs::write(&path, updated).map_err(|e| ExportError::WriteError {
                path: path.clone(),
                source: e,
            })?;
            notes_rewritten += 1;
            links_rewritten += count;
            tracing::debug!(note = %relative, links = count, "rewrote links");
        }
    }

    Ok((notes_rewritten, links_rewritten))
}

/// Splice replacement link text into a note. Replacements are applied in
/// reverse document order so earlier byte offsets stay valid.
fn apply_rewrites(
    content: &str,
    references: &[LinkReference],
    renames: &RenameTable,
) -> (String, usize) {
    let mut updated = content.to_string();
    let mut count = 0;

    for reference in references.iter().rev() {
        let Some(final_path) = renames.resolve(reference.basename()) else {
            continue;
        };
        let replacement = render_link(reference, final_path);
        if &updated[reference.start..reference.end] != replacement.as_str() {
            updated.replace_range(reference.start..reference.end, &replacement);
            count += 1;
        }
    }

    (updated, count)
}

/// Rebuild a reference in its original syntax around the final path.
/// Aliases and display text survive; heading fragments are dropped.
fn render_link(reference: &LinkReference, final_path: &str) -> String {
    match reference.syntax {
        LinkSyntax::Wikilink => match &reference.alias {
            Some(alias) => format!("[[{final_path}|{alias}]]"),
            None => format!("[[{final_path}]]"),
        },
        LinkSyntax::Markdown => {
            format!("[{}]({})", reference.alias.as_deref().unwrap_or(""), final_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(content: &str, renames: &RenameTable) -> (String, usize) {
        let references = parse_links(content, "md");
        apply_rewrites(content, &references, renames)
    }

    #[test]
    fn test_wikilink_with_alias_rewritten() {
        let mut renames = RenameTable::default();
        renames.record("Other Note.md", "references/Other Note.md");

        let (updated, count) = rewrite("See [[Other Note|the other]].", &renames);

        assert_eq!(updated, "See [[references/Other Note.md|the other]].");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_markdown_image_keeps_bang_and_text() {
        let mut renames = RenameTable::default();
        renames.record("photo.png", "attachments/photo.png");

        let (updated, count) = rewrite("Shot: ![photo](../img/photo.png)", &renames);

        assert_eq!(updated, "Shot: ![photo](attachments/photo.png)");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_fragment_dropped_on_rewrite() {
        let mut renames = RenameTable::default();
        renames.record("Design.md", "references/Design.md");

        let (updated, _) = rewrite("See [[Design#Decisions]].", &renames);

        assert_eq!(updated, "See [[references/Design.md]].");
    }

    #[test]
    fn test_unknown_target_left_as_written() {
        let renames = RenameTable::default();

        let (updated, count) = rewrite("Dangling [[Missing Note]].", &renames);

        assert_eq!(updated, "Dangling [[Missing Note]].");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_chain_resolves_to_final_name() {
        let mut renames = RenameTable::default();
        renames.record("photo.png", "attachments/photo.png");
        renames.record("shot.png", "attachments/photo.png");
        renames.reassign("photo.png", "attachments/photo.png", "attachments/photo_ab12cd34.png");

        let (updated, _) = rewrite("![[shot.png]] and ![[photo.png]]", &renames);

        assert_eq!(
            updated,
            "![[attachments/photo_ab12cd34.png]] and ![[attachments/photo_ab12cd34.png]]"
        );
    }

    #[test]
    fn test_multiple_links_one_line() {
        let mut renames = RenameTable::default();
        renames.record("A.md", "references/A.md");
        renames.record("B.md", "references/B.md");

        let (updated, count) = rewrite("[[A]] then [[B]] then [[A|again]]", &renames);

        assert_eq!(
            updated,
            "[[references/A.md]] then [[references/B.md]] then [[references/A.md|again]]"
        );
        assert_eq!(count, 3);
    }

    #[test]
    fn test_excalidraw_embed_rewrites_to_raster() {
        let mut renames = RenameTable::default();
        renames.record(
            "Diagram.excalidraw.dark.png",
            "attachments/Diagram.excalidraw.dark.png",
        );

        let (updated, _) = rewrite("![[Diagram.excalidraw]]", &renames);

        assert_eq!(updated, "![[attachments/Diagram.excalidraw.dark.png]]");
    }

    #[test]
    fn test_seed_self_reference_already_final() {
        let mut renames = RenameTable::default();
        renames.record("Index.md", "Index.md");

        // A wikilink to the seed still normalizes to the full file name
        let (updated, count) = rewrite("Back to [[Index]].", &renames);

        assert_eq!(updated, "Back to [[Index.md]].");
        assert_eq!(count, 1);
    }
}
