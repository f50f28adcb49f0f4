//! Core library for vaultpack: exports a connected set of markdown notes
//! and their attachments out of a document store into a self-contained
//! directory, deduplicating attachment content and rewriting links to
//! match what was actually placed on disk.

pub mod config;
pub mod export;
pub mod link;
pub mod resolve;
pub mod vault;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
