//! Lifecycle — writes status, state, inputs and outputs back to the store.

use std::collections::BTreeMap;

use chrono::Local;
use tracing::{debug, info, warn};

use gulp_core::{State, Status, keys};
use gulp_state::{AssemblyRecord, AssemblyUpdate, StateStore};

use crate::boxes::BoxSpec;
use crate::carton::Carton;
use crate::error::{CartonError, CartonResult};
use crate::events::EventNotifier;

/// RFC 822 style stamp written to `lastsuccessstatusupdate`.
const STATUS_STAMP_FORMAT: &str = "%d %b %y %H:%M %Z";

#[derive(Clone)]
pub struct Lifecycle {
    store: StateStore,
    notifier: EventNotifier,
}

impl Lifecycle {
    pub fn new(store: StateStore, notifier: EventNotifier) -> Self {
        Self { store, notifier }
    }

    /// Record a new status on the assembly and publish one event for it.
    ///
    /// The event is attempted only after the update is committed. A publish
    /// failure comes back as [`CartonError::Notify`]; the record already
    /// reflects the new status by then.
    pub fn set_status(&self, record: &mut AssemblyRecord, status: Status) -> CartonResult<()> {
        let stamp = Local::now().format(STATUS_STAMP_FORMAT).to_string();
        let mut inputs = record.inputs.clone();
        inputs.nuke_and_set(BTreeMap::from([
            (keys::LAST_SUCCESS_STATUS_UPDATE.to_string(), vec![stamp]),
            (keys::STATUS.to_string(), vec![status.to_string()]),
        ]));

        let updated = self.store.update_assembly(
            &record.id,
            &record.org_id,
            AssemblyUpdate {
                status: Some(status.clone()),
                inputs: Some(inputs),
                ..Default::default()
            },
        )?;
        record.status = updated.status;
        record.inputs = updated.inputs;
        info!(id = %record.id, status = %status, "status updated");

        self.notifier.notify(&record.id, &status).map_err(|e| {
            warn!(id = %record.id, error = %e, "status event not published");
            CartonError::from(e)
        })
    }

    /// Record a new state. No inputs change and no event is published.
    pub fn set_state(&self, record: &mut AssemblyRecord, state: State) -> CartonResult<()> {
        let updated = self.store.update_assembly(
            &record.id,
            &record.org_id,
            AssemblyUpdate {
                state: Some(state),
                ..Default::default()
            },
        )?;
        record.state = updated.state;
        debug!(id = %record.id, state = %record.state, "state updated");
        Ok(())
    }

    /// Replace the given output keys and persist the outputs.
    pub fn nuke_and_set_outputs(
        &self,
        record: &mut AssemblyRecord,
        updates: BTreeMap<String, Vec<String>>,
    ) -> CartonResult<()> {
        if updates.is_empty() {
            return Err(CartonError::NoOutputs);
        }
        let mut outputs = record.outputs.clone();
        outputs.nuke_and_set(updates);
        let updated = self.store.update_assembly(
            &record.id,
            &record.org_id,
            AssemblyUpdate {
                outputs: Some(outputs),
                ..Default::default()
            },
        )?;
        record.outputs = updated.outputs;
        debug!(id = %record.id, outputs = record.outputs.len(), "outputs updated");
        Ok(())
    }

    /// Drop every input entry named `key` and persist the inputs.
    pub fn nuke_keys_inputs(&self, record: &mut AssemblyRecord, key: &str) -> CartonResult<()> {
        if key.is_empty() {
            return Ok(());
        }
        let mut inputs = record.inputs.clone();
        inputs.nuke_keys(key);
        let updated = self.store.update_assembly(
            &record.id,
            &record.org_id,
            AssemblyUpdate {
                inputs: Some(inputs),
                ..Default::default()
            },
        )?;
        record.inputs = updated.inputs;
        debug!(id = %record.id, key, "input key removed");
        Ok(())
    }

    pub fn set_status_by_id(&self, id: &str, status: Status) -> CartonResult<()> {
        let mut record = self.load(id)?;
        self.set_status(&mut record, status)
    }

    pub fn set_state_by_id(&self, id: &str, state: State) -> CartonResult<()> {
        let mut record = self.load(id)?;
        self.set_state(&mut record, state)
    }

    fn load(&self, id: &str) -> CartonResult<AssemblyRecord> {
        self.store
            .get_assembly(id)?
            .ok_or_else(|| CartonError::AssemblyNotFound(id.to_string()))
    }
}

/// Anything whose status and state are tracked on an assembly record.
pub trait StatusSettable {
    fn set_status(&mut self, lifecycle: &Lifecycle, status: Status) -> CartonResult<()>;
    fn set_state(&mut self, lifecycle: &Lifecycle, state: State) -> CartonResult<()>;
}

/// Keep the snapshot in step with the store: a notify failure still means
/// the status was committed.
fn committed<T>(result: &CartonResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => e.is_notify_failure(),
    }
}

impl StatusSettable for Carton {
    fn set_status(&mut self, lifecycle: &Lifecycle, status: Status) -> CartonResult<()> {
        let result = lifecycle.set_status_by_id(&self.id, status.clone());
        if committed(&result) {
            self.status = status;
        }
        result
    }

    fn set_state(&mut self, lifecycle: &Lifecycle, state: State) -> CartonResult<()> {
        lifecycle.set_state_by_id(&self.id, state.clone())?;
        self.state = state;
        Ok(())
    }
}

impl StatusSettable for BoxSpec {
    fn set_status(&mut self, lifecycle: &Lifecycle, status: Status) -> CartonResult<()> {
        let result = lifecycle.set_status_by_id(&self.carton_id, status.clone());
        if committed(&result) {
            self.status = status;
        }
        result
    }

    fn set_state(&mut self, lifecycle: &Lifecycle, state: State) -> CartonResult<()> {
        lifecycle.set_state_by_id(&self.carton_id, state.clone())?;
        self.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gulp_core::{GulpConfig, Kvp};
    use tokio::sync::broadcast::error::TryRecvError;

    use crate::events::{BroadcastEventBus, EventBus};

    fn record() -> AssemblyRecord {
        AssemblyRecord {
            id: "a1".into(),
            org_id: "ORG1".into(),
            name: "tolerant".into(),
            inputs: Kvp::from_iter([
                ("cpu", vec!["2".to_string()]),
                ("status", vec!["Pending".to_string()]),
            ]),
            status: Status::new("Pending"),
            state: State::new("initialized"),
            ..Default::default()
        }
    }

    fn setup() -> (Lifecycle, BroadcastEventBus) {
        let store = StateStore::open_in_memory().unwrap();
        store.put_assembly(&record()).unwrap();
        let config = Arc::new(GulpConfig::scaffold("a1", "info@megam.io"));
        let bus = BroadcastEventBus::default();
        let bus_dyn: Arc<dyn EventBus> = Arc::new(bus.clone());
        let notifier = EventNotifier::new(bus_dyn, config);
        (Lifecycle::new(store, notifier), bus)
    }

    #[test]
    fn set_status_persists_inputs_and_emits_one_event() {
        let (lc, bus) = setup();
        let mut rx = bus.subscribe();
        let mut rec = record();

        lc.set_status(&mut rec, Status::running()).unwrap();

        let stored = lc.store.get_assembly("a1").unwrap().unwrap();
        assert_eq!(stored.status.as_str(), "Running");
        assert_eq!(stored.inputs.matches("status"), "Running");
        assert!(!stored.inputs.matches("lastsuccessstatusupdate").is_empty());
        assert_eq!(stored.inputs.matches("cpu"), "2");
        assert_eq!(
            stored.inputs.iter().filter(|p| p.key == "status").count(),
            1
        );
        assert_eq!(rec, stored);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.data.metadata["assembly_id"], "a1");
        assert_eq!(event.data.metadata["event_type"], "compute.instance.running");
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn set_state_touches_state_only() {
        let (lc, bus) = setup();
        let mut rx = bus.subscribe();
        let mut rec = record();

        lc.set_state(&mut rec, State::new("deployed")).unwrap();

        let stored = lc.store.get_assembly("a1").unwrap().unwrap();
        assert_eq!(stored.state.as_str(), "deployed");
        assert_eq!(stored.status.as_str(), "Pending");
        assert_eq!(stored.inputs, record().inputs);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn set_status_on_unknown_org_fails_without_event() {
        let (lc, bus) = setup();
        let mut rx = bus.subscribe();
        let mut rec = record();
        rec.org_id = "ORG9".into();

        let err = lc.set_status(&mut rec, Status::running()).unwrap_err();
        assert!(matches!(err, CartonError::State(_)));
        assert_eq!(rec.status.as_str(), "Pending");
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn notify_failure_keeps_committed_status() {
        let (lc, bus) = setup();
        bus.close();
        let mut rec = record();

        let err = lc.set_status(&mut rec, Status::running()).unwrap_err();
        assert!(err.is_notify_failure());
        assert_eq!(rec.status.as_str(), "Running");
        let stored = lc.store.get_assembly("a1").unwrap().unwrap();
        assert_eq!(stored.status.as_str(), "Running");
    }

    #[test]
    fn outputs_require_updates() {
        let (lc, _bus) = setup();
        let mut rec = record();
        assert!(matches!(
            lc.nuke_and_set_outputs(&mut rec, BTreeMap::new()),
            Err(CartonError::NoOutputs)
        ));

        lc.nuke_and_set_outputs(
            &mut rec,
            BTreeMap::from([("publicipv4".to_string(), vec!["10.0.0.5".to_string()])]),
        )
        .unwrap();
        let stored = lc.store.get_assembly("a1").unwrap().unwrap();
        assert_eq!(stored.outputs.matches("publicipv4"), "10.0.0.5");
    }

    #[test]
    fn nuke_keys_inputs_removes_key() {
        let (lc, _bus) = setup();
        let mut rec = record();

        lc.nuke_keys_inputs(&mut rec, "").unwrap();
        assert_eq!(rec.inputs.len(), 2);

        lc.nuke_keys_inputs(&mut rec, "cpu").unwrap();
        let stored = lc.store.get_assembly("a1").unwrap().unwrap();
        assert!(stored.inputs.get("cpu").is_none());
        assert_eq!(stored.inputs.matches("status"), "Pending");
    }

    #[test]
    fn by_id_reports_missing_assembly() {
        let (lc, _bus) = setup();
        assert!(matches!(
            lc.set_state_by_id("zz", State::new("x")),
            Err(CartonError::AssemblyNotFound(_))
        ));
    }

    #[test]
    fn carton_and_box_update_their_snapshots() {
        let (lc, bus) = setup();
        let mut rx = bus.subscribe();

        let mut carton = Carton {
            id: "a1".into(),
            ..Default::default()
        };
        carton.set_status(&lc, Status::new(Status::STARTING)).unwrap();
        assert_eq!(carton.status.as_str(), "Starting");

        let mut b = BoxSpec {
            id: "c1".into(),
            carton_id: "a1".into(),
            ..Default::default()
        };
        b.set_status(&lc, Status::new(Status::STARTED)).unwrap();
        b.set_state(&lc, State::new("deployed")).unwrap();
        assert_eq!(b.status.as_str(), "Started");
        assert_eq!(b.state.as_str(), "deployed");

        let stored = lc.store.get_assembly("a1").unwrap().unwrap();
        assert_eq!(stored.status.as_str(), "Started");
        assert_eq!(stored.state.as_str(), "deployed");

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn box_without_carton_fails() {
        let (lc, _bus) = setup();
        let mut b = BoxSpec::default();
        assert!(b.set_status(&lc, Status::running()).is_err());
        assert_eq!(b.status, Status::default());
    }
}
