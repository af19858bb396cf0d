//! Purpose: Shared library crate used by the `blendb` CLI, server, and tests.
//! Exports: `api` (public surface), `core` (records, registry, stores, sessions).
//! Role: Internal library backing the binary; the `api` module is the intended
//! entry point.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
