//! Store file discovery and content hashing.
//!
//! This module provides utilities for walking document store directories
//! and computing content hashes for deduplication.

pub mod hasher;
pub mod walker;

pub use hasher::{SHORT_HASH_LEN, content_hash, short_hash};
pub use walker::{StoreWalker, StoreWalkerError, WalkedFile, is_note_file};
