//! Node status registration, run once at startup.
//!
//! Every step is advisory: failures are logged and the next step still
//! runs. The returned [`Registration`] records what succeeded.

use serde::Serialize;
use tracing::{error, info, warn};

use gulp_carton::Lifecycle;
use gulp_core::{GulpConfig, Status};

use crate::coordinator::Coordinator;
use crate::error::ClusterError;
use crate::membership::check_member;

/// Status value written to the node's registry entry.
pub const NODE_STATUS_RUNNING: &str = "RUNNING";

#[derive(Debug, Serialize)]
struct NodeEntry<'a> {
    id: &'a str,
    status: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub synced: bool,
    /// Members that failed the scheme or host check.
    pub invalid_members: Vec<String>,
    pub path: String,
    pub registered: bool,
    pub status_updated: bool,
}

/// Announce the node to the coordination cluster and mark its assembly
/// `Running`.
pub fn register_status(
    coordinator: &dyn Coordinator,
    lifecycle: &Lifecycle,
    config: &GulpConfig,
) -> Registration {
    let coord = &config.coordination;
    let mut reg = Registration {
        path: format!("/{}/{}", coord.directory.trim_matches('/'), config.meta.name),
        ..Default::default()
    };

    reg.synced = coordinator.sync_cluster();
    if !reg.synced {
        warn!("coordination cluster sync failed");
    }

    for raw in coordinator.cluster() {
        if let Err(e) = check_member(&raw, &coord.expected_scheme, &coord.expected_host) {
            warn!(error = %e, "unexpected coordination member");
            reg.invalid_members.push(raw);
        }
    }

    let entry = NodeEntry {
        id: &config.meta.id,
        status: NODE_STATUS_RUNNING,
    };
    let created = serde_json::to_string(&entry)
        .map_err(|e| ClusterError::Encode(e.to_string()))
        .and_then(|value| coordinator.create(&reg.path, &value));
    match created {
        Ok(()) => reg.registered = true,
        Err(e) => error!(path = %reg.path, error = %e, "node registration failed"),
    }

    match lifecycle.set_status_by_id(&config.meta.id, Status::running()) {
        Ok(()) => reg.status_updated = true,
        Err(e) if e.is_notify_failure() => {
            reg.status_updated = true;
            warn!(id = %config.meta.id, error = %e, "running status stored without event");
        }
        Err(e) => error!(id = %config.meta.id, error = %e, "running status update failed"),
    }

    info!(
        path = %reg.path,
        synced = reg.synced,
        registered = reg.registered,
        status_updated = reg.status_updated,
        "node status registered"
    );
    reg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gulp_carton::{BroadcastEventBus, EventBus, EventNotifier};
    use gulp_state::{AssemblyRecord, StateStore};

    use crate::coordinator::StoreCoordinator;
    use crate::error::ClusterResult;

    struct Fixture {
        coord: StoreCoordinator,
        lc: Lifecycle,
        config: GulpConfig,
        store: StateStore,
    }

    fn setup(endpoints: &[&str], with_assembly: bool) -> Fixture {
        let store = StateStore::open_in_memory().unwrap();
        if with_assembly {
            store
                .put_assembly(&AssemblyRecord {
                    id: "a1".into(),
                    org_id: "ORG1".into(),
                    name: "tolerant".into(),
                    status: Status::new("Pending"),
                    ..Default::default()
                })
                .unwrap();
        }
        let mut config = GulpConfig::scaffold("a1", "info@megam.io");
        config.coordination.endpoints = endpoints.iter().map(|e| e.to_string()).collect();
        let shared = Arc::new(config.clone());
        let bus: Arc<dyn EventBus> = Arc::new(BroadcastEventBus::default());
        let lc = Lifecycle::new(store.clone(), EventNotifier::new(bus, shared));
        let coord = StoreCoordinator::from_config(store.clone(), &config.coordination);
        Fixture {
            coord,
            lc,
            config,
            store,
        }
    }

    #[test]
    fn registers_node_and_marks_running() {
        let Fixture { coord, lc, config, store } = setup(&["http://127.0.0.1:2379"], true);

        let reg = register_status(&coord, &lc, &config);

        assert!(reg.synced);
        assert!(reg.invalid_members.is_empty());
        assert!(reg.registered);
        assert!(reg.status_updated);
        assert_eq!(reg.path, "/cloudinabox/gulpd");

        let entry = coord.get("/cloudinabox/gulpd").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&entry.value).unwrap();
        assert_eq!(value["id"], "a1");
        assert_eq!(value["status"], "RUNNING");

        let stored = store.get_assembly("a1").unwrap().unwrap();
        assert_eq!(stored.status.as_str(), "Running");
    }

    #[test]
    fn member_mismatch_is_advisory() {
        let Fixture { coord, lc, config, .. } = setup(&["https://10.0.0.9:2379"], true);

        let reg = register_status(&coord, &lc, &config);

        assert_eq!(reg.invalid_members, vec!["https://10.0.0.9:2379"]);
        assert!(reg.registered);
        assert!(reg.status_updated);
    }

    #[test]
    fn missing_assembly_still_registers() {
        let Fixture { coord, lc, config, .. } = setup(&[], false);

        let reg = register_status(&coord, &lc, &config);

        assert!(!reg.synced);
        assert!(reg.registered);
        assert!(!reg.status_updated);
    }

    struct RefusingCoordinator;

    impl Coordinator for RefusingCoordinator {
        fn sync_cluster(&self) -> bool {
            false
        }

        fn cluster(&self) -> Vec<String> {
            Vec::new()
        }

        fn create(&self, path: &str, _value: &str) -> ClusterResult<()> {
            Err(ClusterError::InvalidPath(path.to_string()))
        }
    }

    #[test]
    fn create_failure_still_updates_status() {
        let Fixture { lc, config, .. } = setup(&[], true);

        let reg = register_status(&RefusingCoordinator, &lc, &config);

        assert!(!reg.registered);
        assert!(reg.status_updated);
    }
}
