//! Coordination-service client.
//!
//! The coordinator answers two questions for a node: which members make up
//! the coordination cluster, and where the node's registration entry lives.

use std::sync::RwLock;

use tracing::{debug, info, warn};

use gulp_core::config::CoordinationConfig;
use gulp_state::{RegistryEntry, StateStore};

use crate::error::{ClusterError, ClusterResult};

pub trait Coordinator: Send + Sync {
    /// Refresh the member list. Returns false when no member is reachable.
    fn sync_cluster(&self) -> bool;

    /// Member URLs from the last successful sync.
    fn cluster(&self) -> Vec<String>;

    /// Create or replace the entry at `path`.
    fn create(&self, path: &str, value: &str) -> ClusterResult<()>;
}

/// Coordinator backed by the node's registry table.
///
/// Members are the configured endpoints that parse as URLs.
pub struct StoreCoordinator {
    store: StateStore,
    endpoints: Vec<String>,
    members: RwLock<Vec<String>>,
}

impl StoreCoordinator {
    pub fn new(store: StateStore, endpoints: Vec<String>) -> Self {
        Self {
            store,
            endpoints,
            members: RwLock::new(Vec::new()),
        }
    }

    pub fn from_config(store: StateStore, config: &CoordinationConfig) -> Self {
        Self::new(store, config.endpoints.clone())
    }

    pub fn get(&self, path: &str) -> ClusterResult<Option<RegistryEntry>> {
        Ok(self.store.get_registry(path)?)
    }

    /// Entries under `prefix`, in path order.
    pub fn list(&self, prefix: &str) -> ClusterResult<Vec<RegistryEntry>> {
        Ok(self.store.list_registry(prefix)?)
    }
}

impl Coordinator for StoreCoordinator {
    fn sync_cluster(&self) -> bool {
        let synced: Vec<String> = self
            .endpoints
            .iter()
            .filter(|ep| match url::Url::parse(ep) {
                Ok(_) => true,
                Err(e) => {
                    warn!(endpoint = %ep, error = %e, "skipping unparseable endpoint");
                    false
                }
            })
            .cloned()
            .collect();

        let ok = !synced.is_empty();
        debug!(members = synced.len(), "cluster synced");
        *self.members.write().expect("members lock") = synced;
        ok
    }

    fn cluster(&self) -> Vec<String> {
        self.members.read().expect("members lock").clone()
    }

    fn create(&self, path: &str, value: &str) -> ClusterResult<()> {
        if !path.starts_with('/') || path.len() < 2 {
            return Err(ClusterError::InvalidPath(path.to_string()));
        }
        self.store.put_registry(path, value)?;
        info!(%path, "registry entry created");
        Ok(())
    }
}
