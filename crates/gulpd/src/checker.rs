//! Startup dependency check.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use gulp_queue::{Broker, BrokerError};
use gulp_state::{StateError, StateStore};

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{0}")]
    Broker(#[from] BrokerError),

    #[error("{0}")]
    Store(#[from] StateError),
}

impl CheckError {
    /// Operator hint printed under the error.
    pub fn hint(&self) -> &'static str {
        match self {
            CheckError::Broker(_) => "Please start the message broker service.",
            CheckError::Store(_) => "Please check the record store.",
        }
    }

    /// Text written to stderr before the process exits.
    pub fn report(&self) -> String {
        format!("Error: {self}\n {}", self.hint())
    }
}

/// Verifies the broker and the record store before anything starts.
pub struct Checker {
    broker: Arc<dyn Broker>,
    store: StateStore,
}

impl Checker {
    pub fn new(broker: Arc<dyn Broker>, store: StateStore) -> Self {
        Self { broker, store }
    }

    pub async fn check(&self) -> Result<(), CheckError> {
        self.broker.dial().await?;
        self.store.ping()?;
        info!("dependencies ok");
        Ok(())
    }
}
