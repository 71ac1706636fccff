//! Key-addressed object storage for Coffer.
//!
//! This crate persists typed values under string keys. A value travels
//! through three layers on its way to disk:
//!
//! 1. [`Serializer`] -- named-field JSON envelope, tolerant of fields being
//!    added or removed between write and read.
//! 2. [`Encryption`] -- pluggable; [`NoEncryption`] by default,
//!    [`XChaChaEncryption`] for authenticated encryption.
//! 3. [`ObjectStore`] -- one opaque payload per key.
//!
//! [`Storage`] composes them with an [`ObjectCache`] of decoded values.
//!
//! # Storage Backends
//!
//! - [`FileObjectStore`] -- one file per key, atomic temp-file-then-rename
//!   writes, CRC-checked frames
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. A write replaces the whole entry; a torn entry is never readable.
//! 2. Absent keys are not errors: reads return `None`, deletes are no-ops.
//! 3. Corrupt payloads are errors, never treated as absent.
//! 4. The cache only ever holds values that match durable storage, except
//!    while a write for the same key is in flight.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod cache;
pub mod encryption;
pub mod error;
pub mod file;
pub mod memory;
pub mod serializer;
pub mod storage;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use cache::{CacheStats, CachedValue, ObjectCache};
pub use encryption::{Encryption, NoEncryption, XChaChaEncryption};
pub use error::{StoreError, StoreResult};
pub use file::{FileObjectStore, SyncMode};
pub use memory::InMemoryObjectStore;
pub use serializer::Serializer;
pub use storage::Storage;
pub use traits::ObjectStore;
