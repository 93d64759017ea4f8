//! Integration test utilities for the study-sync engine
//!
//! This crate provides helpers for composing the full engine over the
//! in-memory store and waiting on derived state.

pub mod helpers;

pub use helpers::*;
