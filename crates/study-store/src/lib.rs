//! # study-store
//!
//! In-process implementation of the `study-core` document-store port.
//!
//! [`MemoryStore`] backs local development and the test suite: it keeps
//! insertion-ordered collections in memory, applies the same merge /
//! append / increment semantics the remote service guarantees, and pushes
//! full snapshots to subscribers through `tokio::watch` channels.

pub mod memory;

pub use memory::MemoryStore;
