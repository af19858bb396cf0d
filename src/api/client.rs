//! Purpose: Session acquisition for local store federations.
//! Exports: `SessionFactory`.
//! Role: Owns the registry and per-backend store configuration; hands out one
//! federated session per unit of work.
//! Invariants: One store config per registered backend, checked at build time.
//! Invariants: Named in-memory stores stay alive for the factory's lifetime.
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::core::error::{Error, ErrorKind};
use crate::core::registry::{BackendId, StoreRegistry};
use crate::core::session::FederatedSession;
use crate::core::store::{SqliteStore, StoreConfig, StoreLocation};

pub type ApiResult<T> = Result<T, Error>;

#[derive(Debug)]
pub struct SessionFactory {
    registry: Arc<StoreRegistry>,
    // Registration order, mirroring `registry.backends()`.
    stores: Vec<SqliteStore>,
    // A shared-cache in-memory database vanishes when its last connection
    // closes; these anchors keep each one alive between sessions.
    anchors: Mutex<Vec<Connection>>,
}

impl SessionFactory {
    /// Build the federation: one store config per registered backend, schemas
    /// created up front.
    pub fn new(registry: StoreRegistry, configs: Vec<StoreConfig>) -> ApiResult<Self> {
        let registry = Arc::new(registry);
        let mut stores = Vec::with_capacity(registry.backends().len());
        for backend in registry.backends() {
            let matches: Vec<&StoreConfig> = configs
                .iter()
                .filter(|config| config.backend == *backend)
                .collect();
            let config = match matches.as_slice() {
                [config] => (*config).clone(),
                [] => {
                    return Err(Error::new(ErrorKind::Usage)
                        .with_message("no store config for registered backend")
                        .with_backend(*backend));
                }
                _ => {
                    return Err(Error::new(ErrorKind::Usage)
                        .with_message("multiple store configs for one backend")
                        .with_backend(*backend));
                }
            };
            stores.push(SqliteStore::new(config, registry.types_for(*backend)));
        }
        if configs.len() != stores.len() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("store config references an unregistered backend"));
        }

        let mut anchors = Vec::new();
        for store in &stores {
            // A shared-cache in-memory database is deleted the moment its
            // last connection closes, so the anchor must exist before the
            // schema connection opens and closes.
            if matches!(store.location(), StoreLocation::Memory(_)) {
                anchors.push(store.connect()?);
            }
            store.ensure_schema()?;
        }

        Ok(Self {
            registry,
            stores,
            anchors: Mutex::new(anchors),
        })
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn store(&self, backend: BackendId) -> Option<&SqliteStore> {
        self.stores.iter().find(|store| store.backend() == backend)
    }

    /// One federated session per unit of work. The caller owns the close.
    pub fn session(&self) -> ApiResult<FederatedSession> {
        let mut handles = Vec::with_capacity(self.stores.len());
        for store in &self.stores {
            handles.push(store.open_session()?);
        }
        Ok(FederatedSession::new(self.registry.clone(), handles))
    }

    /// Scoped acquisition: the session is closed on every exit path.
    pub fn with_session<T>(
        &self,
        f: impl FnOnce(&mut FederatedSession) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let mut session = self.session()?;
        let result = f(&mut session);
        session.close();
        result
    }
}

impl Drop for SessionFactory {
    fn drop(&mut self) {
        if let Ok(mut anchors) = self.anchors.lock() {
            anchors.clear();
        }
    }
}
