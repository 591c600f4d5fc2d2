//! Action messages carried on the node's queues.

use std::fmt;

use serde::{Deserialize, Serialize};

use gulp_core::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Stop,
    Build,
    Restart,
    Running,
    Addon,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Build => "build",
            Action::Restart => "restart",
            Action::Running => "running",
            Action::Addon => "addon",
        }
    }

    /// Statuses the carton moves through, in order. Empty for actions
    /// that do not change status.
    pub fn transitions(&self) -> Vec<Status> {
        let steps: &[&str] = match self {
            Action::Start => &[Status::STARTING, Status::STARTED],
            Action::Stop => &[Status::STOPPING, Status::STOPPED],
            Action::Build => &[Status::BUILDING, Status::BUILT],
            Action::Restart => &[Status::RESTARTING, Status::RESTARTED],
            Action::Running => &[Status::RUNNING],
            Action::Addon => &[],
        };
        steps.iter().map(|s| Status::new(*s)).collect()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMessage {
    /// Request id.
    pub id: String,
    pub action: Action,
    /// Assembly id.
    pub cat_id: String,
    /// Deployment instance id.
    #[serde(default)]
    pub cartons_id: String,
}

impl ActionMessage {
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_action_message() {
        let msg = ActionMessage::decode(
            br#"{"id":"RQ1","action":"start","cat_id":"a1","cartons_id":"aies1"}"#,
        )
        .unwrap();
        assert_eq!(msg.action, Action::Start);
        assert_eq!(msg.cat_id, "a1");
        assert_eq!(msg.cartons_id, "aies1");
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(ActionMessage::decode(br#"{"id":"RQ1","action":"explode","cat_id":"a1"}"#).is_err());
        assert!(ActionMessage::decode(b"not json").is_err());
    }

    #[test]
    fn transitions_per_action() {
        let names = |a: Action| {
            a.transitions()
                .iter()
                .map(|s| s.as_str().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(Action::Stop), vec!["Stopping", "Stopped"]);
        assert_eq!(names(Action::Running), vec!["Running"]);
        assert!(names(Action::Addon).is_empty());
    }
}
