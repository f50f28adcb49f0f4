//! Link extraction and classification.
//!
//! This module finds outbound references in markdown documents and
//! normalizes their targets for resolution and rewriting.

pub mod parser;
pub mod types;

pub use parser::parse_links;
pub use types::{LinkKind, LinkReference, LinkSyntax};
