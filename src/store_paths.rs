//! Purpose: Default store-file locations for the CLI and server.
//! Exports: `default_data_dir`, `default_store_path`.
//! Role: Keep CLI and server path semantics aligned from one source.
//! Invariants: Default data directory remains `~/.blendb`.

use std::path::PathBuf;

use blendb::api::BackendId;

pub(crate) fn default_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".blendb")
}

pub(crate) fn default_store_path(backend: BackendId) -> PathBuf {
    default_data_dir().join(format!("{}.db", backend.as_str()))
}
