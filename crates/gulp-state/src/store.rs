//! StateStore — redb-backed record persistence for gulp.
//!
//! Provides typed operations over assembly and component records and the
//! coordination registry. All values are JSON-serialized into redb's
//! `&[u8]` value columns. The store supports both on-disk and in-memory
//! backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

const PROBE_KEY: &str = "sampleobject";
const PROBE_VALUE: &[u8] = b"sampledata";

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(ASSEMBLIES).map_err(map_err!(Table))?;
        txn.open_table(COMPONENTS).map_err(map_err!(Table))?;
        txn.open_table(REGISTRY).map_err(map_err!(Table))?;
        txn.open_table(PROBES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn put<T: Serialize>(
        &self,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
        value: &T,
    ) -> StateResult<()> {
        let value = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
    ) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    // ── Assemblies ─────────────────────────────────────────────────

    /// Insert or replace an assembly record.
    pub fn put_assembly(&self, record: &AssemblyRecord) -> StateResult<()> {
        self.put(ASSEMBLIES, &record.id, record)?;
        debug!(id = %record.id, "assembly stored");
        Ok(())
    }

    /// Fetch an assembly record by primary key.
    pub fn get_assembly(&self, id: &str) -> StateResult<Option<AssemblyRecord>> {
        self.get(ASSEMBLIES, id)
    }

    /// Apply field updates to the assembly keyed by `id` + `org_id`.
    ///
    /// Read-modify-write in one write transaction. There is no version
    /// check: the last committed update wins.
    pub fn update_assembly(
        &self,
        id: &str,
        org_id: &str,
        update: AssemblyUpdate,
    ) -> StateResult<AssemblyRecord> {
        let fields = update.fields();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let record = {
            let mut table = txn.open_table(ASSEMBLIES).map_err(map_err!(Table))?;
            let mut record: AssemblyRecord = match table.get(id).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => {
                    return Err(StateError::NotFound {
                        kind: "assembly",
                        key: id.to_string(),
                    });
                }
            };
            if record.org_id != org_id {
                return Err(StateError::NotFound {
                    kind: "assembly",
                    key: format!("{id} in org {org_id}"),
                });
            }
            record.apply(update);
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
            record
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, %org_id, ?fields, "assembly updated");
        Ok(record)
    }

    // ── Components ─────────────────────────────────────────────────

    /// Insert or replace a component record.
    pub fn put_component(&self, record: &ComponentRecord) -> StateResult<()> {
        self.put(COMPONENTS, &record.id, record)?;
        debug!(id = %record.id, "component stored");
        Ok(())
    }

    /// Fetch a component record by id.
    pub fn get_component(&self, id: &str) -> StateResult<Option<ComponentRecord>> {
        self.get(COMPONENTS, id)
    }

    // ── Registry ───────────────────────────────────────────────────

    /// Create or overwrite a registry entry at `path`.
    pub fn put_registry(&self, path: &str, value: &str) -> StateResult<()> {
        let entry = RegistryEntry {
            path: path.to_string(),
            value: value.to_string(),
            updated_at: epoch_secs(),
        };
        self.put(REGISTRY, path, &entry)?;
        debug!(%path, "registry entry written");
        Ok(())
    }

    pub fn get_registry(&self, path: &str) -> StateResult<Option<RegistryEntry>> {
        self.get(REGISTRY, path)
    }

    /// List registry entries under a path prefix.
    pub fn list_registry(&self, prefix: &str) -> StateResult<Vec<RegistryEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REGISTRY).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(prefix) {
                let entry: RegistryEntry =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(entry);
            }
        }
        Ok(results)
    }

    // ── Connectivity ───────────────────────────────────────────────

    /// Smoke test: write a sample object and read it back.
    pub fn ping(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PROBES).map_err(map_err!(Table))?;
            table
                .insert(PROBE_KEY, PROBE_VALUE)
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;

        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PROBES).map_err(map_err!(Table))?;
        match table.get(PROBE_KEY).map_err(map_err!(Read))? {
            Some(guard) if guard.value() == PROBE_VALUE => Ok(()),
            Some(_) => Err(StateError::ProbeMismatch(PROBE_KEY.to_string())),
            None => Err(StateError::NotFound {
                kind: "probe",
                key: PROBE_KEY.to_string(),
            }),
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gulp_core::{Kvp, State, Status};

    fn test_assembly(id: &str) -> AssemblyRecord {
        AssemblyRecord {
            id: id.to_string(),
            org_id: "ORG123".to_string(),
            account_id: "info@megam.io".to_string(),
            name: "tolerant".to_string(),
            json_claz: "Megam::Assembly".to_string(),
            tosca_type: "tosca.torpedo.ubuntu".to_string(),
            inputs: [("cpu", vec!["2".to_string()])].into_iter().collect(),
            outputs: Kvp::new(),
            policies: vec![Policy {
                name: "bind policy".to_string(),
                ptype: "colocated".to_string(),
                members: vec!["c1".to_string()],
            }],
            status: Status::new("Pending"),
            state: State::new("initialized"),
            created_at: "2016-03-01 10:00:00".to_string(),
            components: vec!["c1".to_string()],
        }
    }

    fn test_component(id: &str) -> ComponentRecord {
        ComponentRecord {
            id: id.to_string(),
            name: "web".to_string(),
            tosca_type: "tosca.app.java".to_string(),
            ..Default::default()
        }
    }

    // ── Assembly CRUD ──────────────────────────────────────────────

    #[test]
    fn assembly_put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let record = test_assembly("a1");

        store.put_assembly(&record).unwrap();
        let retrieved = store.get_assembly("a1").unwrap();

        assert_eq!(retrieved, Some(record));
    }

    #[test]
    fn assembly_get_nonexistent_returns_none() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get_assembly("nope").unwrap().is_none());
    }

    #[test]
    fn assembly_update_touches_only_given_fields() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_assembly(&test_assembly("a1")).unwrap();

        let updated = store
            .update_assembly(
                "a1",
                "ORG123",
                AssemblyUpdate {
                    status: Some(Status::running()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.status.as_str(), "Running");
        let stored = store.get_assembly("a1").unwrap().unwrap();
        assert_eq!(stored.status.as_str(), "Running");
        assert_eq!(stored.state.as_str(), "initialized");
        assert_eq!(stored.inputs.matches("cpu"), "2");
    }

    #[test]
    fn assembly_update_requires_matching_org() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_assembly(&test_assembly("a1")).unwrap();

        let err = store
            .update_assembly("a1", "OTHER", AssemblyUpdate::default())
            .unwrap_err();
        assert!(err.is_not_found());

        let err = store
            .update_assembly("missing", "ORG123", AssemblyUpdate::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    // ── Component CRUD ─────────────────────────────────────────────

    #[test]
    fn component_put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let comp = test_component("c1");

        store.put_component(&comp).unwrap();
        assert_eq!(store.get_component("c1").unwrap(), Some(comp));
        assert!(store.get_component("c2").unwrap().is_none());
    }

    // ── Registry ───────────────────────────────────────────────────

    #[test]
    fn registry_overwrite_and_prefix_list() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_registry("/cloudinabox/node-a", "{}").unwrap();
        store
            .put_registry("/cloudinabox/node-a", r#"{"status":"RUNNING"}"#)
            .unwrap();
        store.put_registry("/other/node-b", "{}").unwrap();

        let entry = store.get_registry("/cloudinabox/node-a").unwrap().unwrap();
        assert_eq!(entry.value, r#"{"status":"RUNNING"}"#);
        assert_eq!(store.list_registry("/cloudinabox/").unwrap().len(), 1);
    }

    // ── Connectivity ───────────────────────────────────────────────

    #[test]
    fn ping_succeeds_on_fresh_store() {
        let store = StateStore::open_in_memory().unwrap();
        store.ping().unwrap();
        store.ping().unwrap();
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store.put_assembly(&test_assembly("a1")).unwrap();
        }

        // Reopen the same database file.
        let store = StateStore::open(&db_path).unwrap();
        let record = store.get_assembly("a1").unwrap();
        assert_eq!(record.unwrap().name, "tolerant");
    }

    #[test]
    fn malformed_record_fails_whole_read() {
        let store = StateStore::open_in_memory().unwrap();
        let txn = store.db.begin_write().unwrap();
        {
            let mut table = txn.open_table(ASSEMBLIES).unwrap();
            let raw = br#"{"id":"bad","org_id":"o","name":"n","inputs":[{"key":1}]}"#;
            table.insert("bad", raw.as_slice()).unwrap();
        }
        txn.commit().unwrap();

        let err = store.get_assembly("bad").unwrap_err();
        assert!(matches!(err, StateError::Deserialize(_)));
    }
}
