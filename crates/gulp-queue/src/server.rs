//! Queue watcher: one consume loop per queue.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::broker::Broker;
use crate::error::BrokerResult;
use crate::handler::ActionHandler;
use crate::message::ActionMessage;

/// Counts kept by a finished consume loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeReport {
    pub handled: usize,
    pub failed: usize,
    pub dropped: usize,
}

pub struct QueueServer {
    name: String,
    broker: Arc<dyn Broker>,
    handler: Arc<dyn ActionHandler>,
}

impl QueueServer {
    pub fn new(
        name: impl Into<String>,
        broker: Arc<dyn Broker>,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            broker,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume the queue until shutdown is signalled or the broker ends
    /// the stream.
    ///
    /// Undecodable payloads are dropped; handler failures are logged. Only
    /// a failure to attach the consumer is returned.
    pub async fn listen_and_serve(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> BrokerResult<ServeReport> {
        let mut rx = self.broker.consume(&self.name).await?;
        let mut report = ServeReport::default();
        info!(queue = %self.name, "queue watcher started");

        loop {
            tokio::select! {
                payload = rx.recv() => {
                    let Some(payload) = payload else {
                        warn!(queue = %self.name, "queue stream ended");
                        break;
                    };
                    self.dispatch(&payload, &mut report).await;
                }
                _ = shutdown.changed() => {
                    debug!(queue = %self.name, "shutdown signalled");
                    break;
                }
            }
        }

        info!(
            queue = %self.name,
            handled = report.handled,
            failed = report.failed,
            dropped = report.dropped,
            "queue watcher stopped"
        );
        Ok(report)
    }

    async fn dispatch(&self, payload: &[u8], report: &mut ServeReport) {
        let msg = match ActionMessage::decode(payload) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(queue = %self.name, error = %e, bytes = payload.len(), "dropping undecodable message");
                report.dropped += 1;
                return;
            }
        };

        match self.handler.handle(&msg).await {
            Ok(()) => report.handled += 1,
            Err(e) => {
                error!(
                    queue = %self.name,
                    request = %msg.id,
                    action = %msg.action,
                    error = %e,
                    "action failed"
                );
                report.failed += 1;
            }
        }
    }
}
