//! Carton error types.

use thiserror::Error;

use crate::events::EventError;

/// Errors raised while composing cartons or mutating lifecycle status.
#[derive(Debug, Error)]
pub enum CartonError {
    #[error("assembly not found: {0}")]
    AssemblyNotFound(String),

    #[error("component not found: {0}")]
    ComponentNotFound(String),

    #[error("invalid box for component {id}: {reason}")]
    InvalidBox { id: String, reason: String },

    #[error("no outputs to set")]
    NoOutputs,

    #[error("state store error: {0}")]
    State(#[from] gulp_state::StateError),

    /// Raised after a status was persisted; the persisted value stands.
    #[error("status event not published: {0}")]
    Notify(#[from] EventError),
}

impl CartonError {
    /// True when the failure happened after the status change was committed.
    pub fn is_notify_failure(&self) -> bool {
        matches!(self, CartonError::Notify(_))
    }
}

pub type CartonResult<T> = Result<T, CartonError>;
