//! Assembly hydration and box composition.
//!
//! An assembly record references its components by id only. The
//! [`Assembler`] resolves each id into a full [`ComponentRecord`] and
//! returns a hydrated [`Assembly`], or an error: never a partial one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use gulp_core::{Kvp, State, Status, keys};
use gulp_state::{AssemblyRecord, ComponentRecord, Policy, StateStore};

use crate::boxes::{BoxCompute, BoxSpec, BoxSsh};
use crate::component::{ComponentResolver, mk_box};
use crate::error::{CartonError, CartonResult};

/// A hydrated assembly: components resolved and keyed by id.
///
/// Iteration order over `components` is unspecified.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Assembly {
    pub id: String,
    pub org_id: String,
    pub account_id: String,
    pub name: String,
    pub json_claz: String,
    pub tosca_type: String,
    pub inputs: Kvp,
    pub outputs: Kvp,
    pub policies: Vec<Policy>,
    pub status: Status,
    pub state: State,
    pub created_at: String,
    pub components: HashMap<String, ComponentRecord>,
}

/// Whether a stored component reference names a real component.
pub(crate) fn is_valid_component_id(id: &str) -> bool {
    id.trim().len() > 1
}

/// Hydrates assembly records from the store.
#[derive(Clone)]
pub struct Assembler {
    store: StateStore,
    resolver: Arc<dyn ComponentResolver>,
}

impl Assembler {
    /// Assembler resolving components from the same store.
    pub fn new(store: StateStore) -> Self {
        let resolver: Arc<dyn ComponentResolver> = Arc::new(store.clone());
        Self { store, resolver }
    }

    pub fn with_resolver(store: StateStore, resolver: Arc<dyn ComponentResolver>) -> Self {
        Self { store, resolver }
    }

    /// Fetch the raw record for `id`.
    pub fn fetch(&self, id: &str) -> CartonResult<AssemblyRecord> {
        self.store
            .get_assembly(id)?
            .ok_or_else(|| CartonError::AssemblyNotFound(id.to_string()))
    }

    /// Fetch the raw record and resolve every referenced component.
    pub fn hydrate(&self, id: &str) -> CartonResult<Assembly> {
        let record = self.fetch(id)?;
        self.dig(record)
    }

    fn dig(&self, record: AssemblyRecord) -> CartonResult<Assembly> {
        let mut components = HashMap::with_capacity(record.components.len());
        for cid in record.components.iter().filter(|c| is_valid_component_id(c)) {
            match self.resolver.resolve(cid) {
                Ok(comp) => {
                    components.insert(cid.clone(), comp);
                }
                Err(e) => {
                    error!(assembly = %record.id, component = %cid, error = %e, "failed to resolve component");
                    return Err(e);
                }
            }
        }
        debug!(id = %record.id, components = components.len(), "assembly hydrated");

        Ok(Assembly {
            id: record.id,
            org_id: record.org_id,
            account_id: record.account_id,
            name: record.name,
            json_claz: record.json_claz,
            tosca_type: record.tosca_type,
            inputs: record.inputs,
            outputs: record.outputs,
            policies: record.policies,
            status: record.status,
            state: record.state,
            created_at: record.created_at,
            components,
        })
    }
}

impl Assembly {
    pub fn sshkey(&self) -> String {
        self.inputs.matches(keys::SSHKEY)
    }

    pub fn password(&self) -> String {
        self.inputs.matches(keys::PASSWORD)
    }

    pub fn user(&self) -> String {
        self.inputs.matches(keys::USERNAME)
    }

    pub fn domain(&self) -> String {
        self.inputs.matches(keys::DOMAIN)
    }

    pub fn provider(&self) -> String {
        self.inputs.matches(keys::PROVIDER)
    }

    pub fn public_ip(&self) -> String {
        self.outputs.matches(keys::PUBLIC_IPV4)
    }

    pub fn image_version(&self) -> String {
        self.inputs.matches(keys::IMAGE_VERSION)
    }

    pub fn cpushare(&self) -> String {
        self.inputs.matches(keys::CPU)
    }

    pub fn memory(&self) -> String {
        self.inputs.matches(keys::RAM)
    }

    pub fn swap(&self) -> String {
        String::new()
    }

    /// HDD size, `"10"` when the assembly carries none.
    pub fn hdd(&self) -> String {
        let hdd = self.inputs.matches(keys::HDD);
        if hdd.trim().is_empty() {
            keys::DEFAULT_HDD.to_string()
        } else {
            hdd
        }
    }

    pub fn new_compute(&self) -> BoxCompute {
        BoxCompute {
            cpushare: self.cpushare(),
            memory: self.memory(),
            swap: self.swap(),
            hdd: self.hdd(),
        }
    }

    /// SSH settings; `default_user` applies when no root username is set.
    pub fn new_ssh(&self, default_user: &str) -> BoxSsh {
        let mut user = self.user();
        if user.trim().is_empty() {
            user = default_user.to_string();
        }
        BoxSsh {
            user,
            prefix: self.sshkey(),
            password: self.password(),
        }
    }

    /// Build one box per valid component, stamped with carton context,
    /// ordered by component id.
    ///
    /// Stops at the first component that cannot be turned into a box.
    pub fn mk_boxes(&self, cartons_id: &str, default_user: &str) -> CartonResult<Vec<BoxSpec>> {
        let mut boxes = Vec::with_capacity(self.components.len());
        let mut comps: Vec<&ComponentRecord> = self.components.values().collect();
        comps.sort_by(|a, b| a.id.cmp(&b.id));

        for comp in comps {
            if !is_valid_component_id(&comp.id) {
                continue;
            }
            let mut b = mk_box(comp)?;
            b.carton_id = self.id.clone();
            b.cartons_id = cartons_id.to_string();
            b.carton_name = self.name.clone();

            if b.provider.trim().is_empty() {
                b.provider = self.provider();
            }
            if b.public_ip.trim().is_empty() {
                b.public_ip = self.public_ip();
            }
            if b.repo_enabled() {
                if let Some(repo) = b.repo.as_mut() {
                    let hook = repo.hook.get_or_insert_with(Default::default);
                    hook.carton_id = self.id.clone();
                    hook.box_id = comp.id.clone();
                }
            }
            b.compute = self.new_compute();
            b.ssh = self.new_ssh(default_user);
            b.status = self.status.clone();
            b.state = self.state.clone();
            boxes.push(b);
        }

        Ok(boxes)
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(s) => f.write_str(&s),
            Err(e) => write!(f, "{e}"),
        }
    }
}
