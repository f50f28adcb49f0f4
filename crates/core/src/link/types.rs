//! Data structures for link extraction.

/// Syntax a reference is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSyntax {
    /// Wikilink: [[target]] or [[target|Display Text]]
    Wikilink,
    /// Standard markdown link: [text](target)
    Markdown,
}

/// What a link target points at, judged by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Another markdown document
    Note,
    /// A binary attachment (image, PDF, diagram raster, ...)
    Attachment,
}

/// A single outbound reference found in a document
#[derive(Debug, Clone)]
pub struct LinkReference {
    /// Normalized target: percent-decoded, fragment stripped, note extension
    /// appended when missing, diagram sources redirected to their raster.
    pub target: String,
    /// What the target points at
    pub kind: LinkKind,
    /// Syntax the reference was written in
    pub syntax: LinkSyntax,
    /// Display text: wikilink alias (if any) or markdown link text
    pub alias: Option<String>,
    /// Heading fragment stripped from the target, if any
    pub fragment: Option<String>,
    /// Byte offset start in the document
    pub start: usize,
    /// Byte offset end in the document
    pub end: usize,
}

impl LinkReference {
    /// Final path component of the normalized target.
    ///
    /// This is the key used by the rename table: links are matched by file
    /// name, not by the directory prefix they were written with.
    pub fn basename(&self) -> &str {
        self.target.rsplit('/').next().unwrap_or(&self.target)
    }

    /// Returns true if the target was written as a bare file name.
    pub fn is_bare(&self) -> bool {
        !self.target.contains('/')
    }
}
