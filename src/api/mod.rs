//! Purpose: Define the stable public Rust API boundary for blendb.
//! Exports: Core types and operations needed by the CLI and the HTTP layer.
//! Role: Public, additive-only surface; callers should not reach into `core`
//! paths directly.
//! Invariants: One federated session per unit of work; the factory is the only
//! way to acquire one.

mod client;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::record::{Order, Record, RecordType, User};
pub use crate::core::registry::{BackendId, StoreRegistry, StoreRegistryBuilder};
pub use crate::core::seed::{demo_records, seed_demo, seed_sample};
pub use crate::core::session::{FederatedSession, Query};
pub use crate::core::store::{SqliteStore, StoreConfig, StoreLocation, StoreSession};
pub use client::{ApiResult, SessionFactory};
