//! Link extraction from markdown documents.
//!
//! Finds wikilinks and markdown links with exact byte positions so the
//! rewrite pass can splice replacements without disturbing surrounding text.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::link::types::{LinkKind, LinkReference, LinkSyntax};

/// Source extension of drawing documents that export a raster alongside.
const DIAGRAM_EXT: &str = "excalidraw";

/// Suffix appended when redirecting a diagram source to its raster.
const DIAGRAM_RASTER_SUFFIX: &str = ".dark.png";

// Regex patterns for link extraction
static WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches [[target]] or [[target|alias]]
    // Captures:
    // 1: target (name or path, may include #fragment)
    // 2: alias (if present)
    Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").unwrap()
});

static MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches [text](url); text may be empty for image embeds
    // Captures:
    // 1: text
    // 2: url
    Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").unwrap()
});

static URI_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Any scheme:// target is external (http, https, obsidian, zotero, ...)
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").unwrap()
});

/// Extract every internal link from a document, in document order.
///
/// Targets are normalized: percent-escapes decoded, a trailing `#fragment`
/// split off, the note extension appended when the target has none, and
/// diagram sources redirected to their raster export. External targets
/// (`scheme://`) are not reported.
pub fn parse_links(content: &str, note_extension: &str) -> Vec<LinkReference> {
    let mut references = Vec::new();

    for cap in WIKILINK_RE.captures_iter(content) {
        let Some(full_match) = cap.get(0) else { continue };
        let raw_target = cap.get(1).map(|m| m.as_str()).unwrap_or("");
        let alias = cap.get(2).map(|m| m.as_str().to_string());

        if let Some(reference) = build_reference(
            raw_target,
            alias,
            LinkSyntax::Wikilink,
            note_extension,
            full_match.start(),
            full_match.end(),
        ) {
            references.push(reference);
        }
    }

    for cap in MARKDOWN_LINK_RE.captures_iter(content) {
        let Some(full_match) = cap.get(0) else { continue };
        let text = cap.get(1).map(|m| m.as_str()).unwrap_or("");
        let url = cap.get(2).map(|m| m.as_str()).unwrap_or("");

        if let Some(reference) = build_reference(
            url,
            Some(text.to_string()),
            LinkSyntax::Markdown,
            note_extension,
            full_match.start(),
            full_match.end(),
        ) {
            references.push(reference);
        }
    }

    references.sort_by_key(|r| r.start);
    references
}

fn build_reference(
    raw_target: &str,
    alias: Option<String>,
    syntax: LinkSyntax,
    note_extension: &str,
    start: usize,
    end: usize,
) -> Option<LinkReference> {
    let raw_target = raw_target.trim();

    if raw_target.is_empty() || URI_SCHEME_RE.is_match(raw_target) {
        return None;
    }

    let decoded = percent_decode(raw_target);
    let (path_part, fragment) = split_fragment(&decoded);

    // [[#Heading]] points inside the same document
    if path_part.is_empty() {
        return None;
    }

    let (target, kind) = classify_target(path_part, note_extension);

    Some(LinkReference { target, kind, syntax, alias, fragment, start, end })
}

/// Separate a target from its heading fragment, if any.
fn split_fragment(target: &str) -> (&str, Option<String>) {
    if let Some(hash_pos) = target.find('#') {
        let path = &target[..hash_pos];
        let fragment = &target[hash_pos + 1..];
        (path, Some(fragment.to_string()))
    } else {
        (target, None)
    }
}

/// Decide what a target points at and normalize its extension.
///
/// Targets without an extension are notes and gain the note extension;
/// targets already carrying it are notes as written. Diagram sources gain
/// the raster suffix. Everything else is an attachment.
fn classify_target(path: &str, note_extension: &str) -> (String, LinkKind) {
    let extension =
        Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("");

    if extension.is_empty() {
        (format!("{path}.{note_extension}"), LinkKind::Note)
    } else if extension.eq_ignore_ascii_case(note_extension) {
        (path.to_string(), LinkKind::Note)
    } else if extension.eq_ignore_ascii_case(DIAGRAM_EXT) {
        (format!("{path}{DIAGRAM_RASTER_SUFFIX}"), LinkKind::Attachment)
    } else {
        (path.to_string(), LinkKind::Attachment)
    }
}

/// Decode %XX escapes. Malformed escapes and sequences that do not form
/// valid UTF-8 leave the input unchanged.
fn percent_decode(input: &str) -> String {
    if !input.contains('%') {
        return input.to_string();
    }

    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            decoded.push(hi * 16 + lo);
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(decoded).unwrap_or_else(|_| input.to_string())
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
