//! Purpose: The federated session: one logical unit of work over every backend.
//! Exports: `FederatedSession`, `Query`.
//! Role: Route `query`/`add` to the owning backend via the registry and
//! sequence per-backend commits to emulate a single logical transaction.
//! Invariants: The set of backend handles is fixed at construction.
//! Invariants: Commit order is backend registration order.
//! Invariants: Commit is best-effort across backends, never atomic; an earlier
//! backend's successful commit stays durable when a later one fails.
//! Invariants: Any operation after `close` fails with `SessionClosed`.
use std::sync::Arc;

use crate::core::error::{Error, ErrorKind};
use crate::core::record::{Record, RecordType};
use crate::core::registry::{BackendId, StoreRegistry};
use crate::core::store::StoreSession;

pub struct FederatedSession {
    registry: Arc<StoreRegistry>,
    // Registration order, which is also commit order.
    handles: Vec<StoreSession>,
    open: bool,
}

impl FederatedSession {
    /// `handles` must carry one session per registered backend, in
    /// registration order. The factory is the only expected caller.
    pub(crate) fn new(registry: Arc<StoreRegistry>, handles: Vec<StoreSession>) -> Self {
        debug_assert_eq!(registry.backends().len(), handles.len());
        Self {
            registry,
            handles,
            open: true,
        }
    }

    /// Resolve the owning backend and return a read handle scoped to it.
    pub fn query(&self, record_type: RecordType) -> Result<Query<'_>, Error> {
        self.ensure_open()?;
        let backend = self.registry.resolve(record_type)?;
        Ok(Query {
            session: self.handle(backend)?,
            record_type,
        })
    }

    /// Stage a record for persistence in its owning backend's session. No
    /// durable identifier is assigned until `commit`.
    pub fn add(&mut self, record: impl Into<Record>) -> Result<(), Error> {
        self.ensure_open()?;
        let record = record.into();
        let backend = self.registry.resolve(record.record_type())?;
        self.handle_mut(backend)?.stage(record);
        Ok(())
    }

    /// Commit every backend session's staged work, in registration order.
    ///
    /// Not atomic across backends: every backend in the sequence is attempted,
    /// and the first failure is returned afterwards with the failing backend
    /// attached. Earlier backends' writes stay durable; the failing backend
    /// rolls back its own staged work. No compensation, no retries.
    pub fn commit(&mut self) -> Result<(), Error> {
        self.ensure_open()?;
        let mut first_failure: Option<Error> = None;
        for handle in &mut self.handles {
            if let Err(err) = handle.commit() {
                tracing::warn!(
                    backend = handle.backend().as_str(),
                    error = %err,
                    "backend commit failed"
                );
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
        match first_failure {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Release every backend session handle. Staged-but-uncommitted work is
    /// dropped. Any later call on this session fails with `SessionClosed`.
    pub fn close(&mut self) {
        for handle in self.handles.drain(..) {
            handle.close();
        }
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.open {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::SessionClosed)
                .with_message("session used after close")
                .with_hint("Acquire a fresh session for each unit of work."))
        }
    }

    fn handle(&self, backend: BackendId) -> Result<&StoreSession, Error> {
        self.handles
            .iter()
            .find(|handle| handle.backend() == backend)
            .ok_or_else(|| missing_handle(backend))
    }

    fn handle_mut(&mut self, backend: BackendId) -> Result<&mut StoreSession, Error> {
        self.handles
            .iter_mut()
            .find(|handle| handle.backend() == backend)
            .ok_or_else(|| missing_handle(backend))
    }
}

impl Drop for FederatedSession {
    // Backstop so handles are never leaked; the explicit `close` (or the
    // factory's scoped acquisition) remains the contract.
    fn drop(&mut self) {
        if self.open {
            self.close();
        }
    }
}

fn missing_handle(backend: BackendId) -> Error {
    Error::new(ErrorKind::Internal)
        .with_message("no session handle for resolved backend")
        .with_backend(backend)
}

/// Read handle scoped to the backend session that owns one record type.
#[derive(Debug)]
pub struct Query<'a> {
    session: &'a StoreSession,
    record_type: RecordType,
}

impl Query<'_> {
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn backend(&self) -> BackendId {
        self.session.backend()
    }

    pub fn fetch_all(&self) -> Result<Vec<Record>, Error> {
        self.session.fetch_all(self.record_type)
    }
}
