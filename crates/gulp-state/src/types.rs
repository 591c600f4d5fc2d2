//! Persisted record shapes for the gulp record store.
//!
//! The control plane owns these records; the agent reads them and writes
//! back status, state, inputs and outputs only.

use serde::{Deserialize, Serialize};

use gulp_core::{Kvp, State, Status};

/// Unique identifier of an assembly.
pub type AssemblyId = String;

/// Unique identifier of a component.
pub type ComponentId = String;

// ── Assembly ──────────────────────────────────────────────────────

/// Raw assembly record: components are referenced by id only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssemblyRecord {
    pub id: AssemblyId,
    pub org_id: String,
    #[serde(default)]
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub json_claz: String,
    #[serde(default)]
    pub tosca_type: String,
    #[serde(default)]
    pub inputs: Kvp,
    #[serde(default)]
    pub outputs: Kvp,
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub state: State,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub components: Vec<ComponentId>,
}

/// Placement or high-availability policy attached to an assembly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    pub name: String,
    #[serde(rename = "type")]
    pub ptype: String,
    /// Ordered member list.
    #[serde(default)]
    pub members: Vec<String>,
}

/// Field updates applied to an assembly record. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyUpdate {
    pub status: Option<Status>,
    pub state: Option<State>,
    pub inputs: Option<Kvp>,
    pub outputs: Option<Kvp>,
}

impl AssemblyUpdate {
    /// Names of the fields this update touches, for logging.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.status.is_some() {
            fields.push("status");
        }
        if self.state.is_some() {
            fields.push("state");
        }
        if self.inputs.is_some() {
            fields.push("inputs");
        }
        if self.outputs.is_some() {
            fields.push("outputs");
        }
        fields
    }

    fn apply(self, record: &mut AssemblyRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(state) = self.state {
            record.state = state;
        }
        if let Some(inputs) = self.inputs {
            record.inputs = inputs;
        }
        if let Some(outputs) = self.outputs {
            record.outputs = outputs;
        }
    }
}

impl AssemblyRecord {
    /// Apply a field update in place.
    pub fn apply(&mut self, update: AssemblyUpdate) {
        update.apply(self);
    }
}

// ── Component ─────────────────────────────────────────────────────

/// Leaf workload definition referenced by id from an assembly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComponentRecord {
    pub id: ComponentId,
    #[serde(default)]
    pub org_id: String,
    pub name: String,
    #[serde(default)]
    pub tosca_type: String,
    #[serde(default)]
    pub inputs: Kvp,
    #[serde(default)]
    pub outputs: Kvp,
    #[serde(default)]
    pub envs: Kvp,
    #[serde(default)]
    pub repo: Option<Repo>,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub state: State,
    #[serde(default)]
    pub created_at: String,
}

/// Source repository linked to a component.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Repo {
    /// "source", "image" or "none".
    pub rtype: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub oneclick: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub hook: Option<Hook>,
}

/// Inbound build-trigger hook. `carton_id`/`box_id` tie a trigger back to
/// the deployable it belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Hook {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub carton_id: String,
    #[serde(default)]
    pub box_id: String,
}

/// Lifecycle operation attached to a component (e.g. `ci`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    pub operation_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: Kvp,
}

pub const REPO_SOURCE: &str = "source";
pub const REPO_IMAGE: &str = "image";
pub const REPO_NONE: &str = "none";

impl Repo {
    pub fn is_known_type(&self) -> bool {
        matches!(self.rtype.as_str(), REPO_SOURCE | REPO_IMAGE | REPO_NONE)
    }

    /// Whether source-repository integration is on for this box.
    pub fn is_enabled(&self) -> bool {
        self.rtype != REPO_NONE && !self.url.trim().is_empty()
    }
}

// ── Registry ──────────────────────────────────────────────────────

/// Coordination registry entry as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryEntry {
    pub path: String,
    pub value: String,
    /// Unix timestamp (seconds) of the last write.
    pub updated_at: u64,
}
