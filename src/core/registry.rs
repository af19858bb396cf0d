//! Purpose: Static record-type-to-backend routing table.
//! Exports: `BackendId`, `StoreRegistry`, `StoreRegistryBuilder`.
//! Role: Resolve which backend owns a record type; fix the commit order.
//! Invariants: Immutable after build; resolution is a pure lookup.
//! Invariants: Backend order is registration order and is the commit order.
use std::collections::BTreeMap;

use crate::core::error::{Error, ErrorKind};
use crate::core::record::RecordType;

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum BackendId {
    Primary,
    Secondary,
}

impl BackendId {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendId::Primary => "primary",
            BackendId::Secondary => "secondary",
        }
    }
}

#[derive(Clone, Debug)]
pub struct StoreRegistry {
    backends: Vec<BackendId>,
    bindings: BTreeMap<RecordType, BackendId>,
}

impl StoreRegistry {
    pub fn builder() -> StoreRegistryBuilder {
        StoreRegistryBuilder {
            backends: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// The stock wiring: users on the primary store, orders on the secondary.
    pub fn standard() -> Self {
        Self::builder()
            .backend(BackendId::Primary)
            .backend(BackendId::Secondary)
            .bind(RecordType::User, BackendId::Primary)
            .bind(RecordType::Order, BackendId::Secondary)
            .build()
            .expect("standard registry wiring")
    }

    pub fn resolve(&self, record_type: RecordType) -> Result<BackendId, Error> {
        self.bindings.get(&record_type).copied().ok_or_else(|| {
            Error::new(ErrorKind::UnrecognizedType)
                .with_message("record type has no registered backend")
                .with_record_type(record_type)
                .with_hint("Bind the type to a backend when building the registry.")
        })
    }

    /// Backends in registration order. Commits are issued in this order.
    pub fn backends(&self) -> &[BackendId] {
        &self.backends
    }

    /// Record types owned by one backend; drives that store's schema.
    pub fn types_for(&self, backend: BackendId) -> Vec<RecordType> {
        self.bindings
            .iter()
            .filter(|(_, owner)| **owner == backend)
            .map(|(record_type, _)| *record_type)
            .collect()
    }
}

pub struct StoreRegistryBuilder {
    backends: Vec<BackendId>,
    bindings: Vec<(RecordType, BackendId)>,
}

impl StoreRegistryBuilder {
    pub fn backend(mut self, backend: BackendId) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn bind(mut self, record_type: RecordType, backend: BackendId) -> Self {
        self.bindings.push((record_type, backend));
        self
    }

    pub fn build(self) -> Result<StoreRegistry, Error> {
        let mut seen = Vec::new();
        for backend in &self.backends {
            if seen.contains(backend) {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("backend registered twice")
                    .with_backend(*backend));
            }
            seen.push(*backend);
        }

        let mut bindings = BTreeMap::new();
        for (record_type, backend) in self.bindings {
            if !self.backends.contains(&backend) {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("binding references an unregistered backend")
                    .with_backend(backend)
                    .with_record_type(record_type));
            }
            if bindings.insert(record_type, backend).is_some() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("record type bound to more than one backend")
                    .with_record_type(record_type));
            }
        }

        Ok(StoreRegistry {
            backends: self.backends,
            bindings,
        })
    }
}
