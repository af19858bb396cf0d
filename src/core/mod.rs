//! Purpose: Core federation logic: records, routing, stores, sessions, seeding.
//! Exports: `error`, `record`, `registry`, `store`, `session`, `seed`.
//! Role: Everything below the public API boundary; no HTTP or CLI concerns.
pub mod error;
pub mod record;
pub mod registry;
pub mod seed;
pub mod session;
pub mod store;
