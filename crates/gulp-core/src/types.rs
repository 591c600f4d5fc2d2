//! Lifecycle status and operational state shared across gulp crates.
//!
//! Both are open string dimensions: the control plane may write any value
//! into a record, so neither is a closed enum. Well-known statuses carry an
//! event classification and a human-readable description.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle progress of an assembly, carton or box (e.g. "Running").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

/// Operational state of an assembly, carton or box, independent of [`Status`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(String);

/// Well-known statuses: (name, event type, progressive?).
///
/// Progressive statuses describe work in flight ("is starting"); the rest
/// describe a completed transition ("started").
const KNOWN_STATUSES: &[(&str, &str, bool)] = &[
    ("launching", "compute.instance.launching", true),
    ("launched", "compute.instance.launched", false),
    ("bootstrapping", "compute.instance.bootstrapping", true),
    ("bootstrapped", "compute.instance.bootstrapped", false),
    ("running", "compute.instance.running", false),
    ("starting", "compute.instance.starting", true),
    ("started", "compute.instance.started", false),
    ("stopping", "compute.instance.stopping", true),
    ("stopped", "compute.instance.stopped", false),
    ("restarting", "compute.instance.restarting", true),
    ("restarted", "compute.instance.restarted", false),
    ("building", "compute.instance.building", true),
    ("built", "compute.instance.built", false),
    ("destroying", "compute.instance.destroying", true),
    ("destroyed", "compute.instance.destroyed", false),
    ("error", "compute.instance.error", false),
];

const UNCLASSIFIED_EVENT: &str = "compute.instance.status";

impl Status {
    pub const RUNNING: &'static str = "Running";
    pub const STARTING: &'static str = "Starting";
    pub const STARTED: &'static str = "Started";
    pub const STOPPING: &'static str = "Stopping";
    pub const STOPPED: &'static str = "Stopped";
    pub const RESTARTING: &'static str = "Restarting";
    pub const RESTARTED: &'static str = "Restarted";
    pub const BUILDING: &'static str = "Building";
    pub const BUILT: &'static str = "Built";

    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn running() -> Self {
        Self::new(Self::RUNNING)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn known(&self) -> Option<&'static (&'static str, &'static str, bool)> {
        let lower = self.0.trim().to_ascii_lowercase();
        KNOWN_STATUSES.iter().find(|(name, _, _)| *name == lower)
    }

    /// Event classification for the status-change notification.
    pub fn event_type(&self) -> &'static str {
        self.known().map_or(UNCLASSIFIED_EVENT, |(_, event, _)| event)
    }

    /// Description of the transition, parameterized by the platform name.
    pub fn description(&self, platform: &str) -> String {
        let status = self.0.trim().to_ascii_lowercase();
        match self.known() {
            Some((_, _, true)) => format!("{platform} is {status}.."),
            Some(_) => format!("{platform} {status} successfully."),
            None => format!("{platform} reported status '{}'.", self.0),
        }
    }
}

impl State {
    pub fn new(state: impl Into<String>) -> Self {
        Self(state.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        Self(s)
    }
}
