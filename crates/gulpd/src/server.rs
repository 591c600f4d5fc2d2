//! Bootstrap control loop.
//!
//! 1. Check the broker and record store.
//! 2. Start one queue watcher per configured queue.
//! 3. Register the node and mark its assembly `Running`.
//! 4. Wait for a termination signal or [`ServerHandle::stop`], then stop
//!    and join every watcher.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use gulp_carton::{BroadcastEventBus, CartonBuilder, Event, EventBus, EventNotifier, Lifecycle};
use gulp_cluster::{Coordinator, Registration, StoreCoordinator, register_status};
use gulp_core::{ConfigError, GulpConfig, keys};
use gulp_queue::{ActionHandler, Broker, BrokerResult, LifecycleHandler, QueueServer, ServeReport};
use gulp_state::StateStore;

use crate::checker::{CheckError, Checker};

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Stops a running [`Server`] from outside the control loop.
#[derive(Clone)]
pub struct ServerHandle {
    shutdown: watch::Sender<bool>,
}

impl ServerHandle {
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }
}

/// What the control loop saw before it returned.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub registration: Registration,
    /// Per queue, in start order. `None` when the watcher failed to attach.
    pub queues: Vec<(String, Option<ServeReport>)>,
}

pub struct Server {
    config: Arc<GulpConfig>,
    store: StateStore,
    broker: Arc<dyn Broker>,
    coordinator: Arc<dyn Coordinator>,
    bus: BroadcastEventBus,
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    pub fn new(config: Arc<GulpConfig>, store: StateStore, broker: Arc<dyn Broker>) -> Self {
        let coordinator = Arc::new(StoreCoordinator::from_config(
            store.clone(),
            &config.coordination,
        ));
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            store,
            broker,
            coordinator,
            bus: BroadcastEventBus::new(EVENT_BUS_CAPACITY),
            shutdown_tx,
        }
    }

    pub fn with_coordinator(mut self, coordinator: Arc<dyn Coordinator>) -> Self {
        self.coordinator = coordinator;
        self
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown_tx.clone(),
        }
    }

    /// Subscribe to the node's status events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Run until `signal` resolves or the handle is stopped.
    pub async fn run<F>(self, signal: F) -> Result<ShutdownReport, ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        self.config.validate()?;
        Checker::new(self.broker.clone(), self.store.clone())
            .check()
            .await?;

        let bus: Arc<dyn EventBus> = Arc::new(self.bus.clone());
        let notifier = EventNotifier::new(bus, self.config.clone());
        let lifecycle = Lifecycle::new(self.store.clone(), notifier);
        let handler: Arc<dyn ActionHandler> = Arc::new(LifecycleHandler::new(
            CartonBuilder::new(self.store.clone(), self.config.clone()),
            lifecycle.clone(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let event_log = spawn_event_log(self.bus.subscribe(), shutdown_rx.clone());

        // ── Queue watchers ───────────────────────────────────────
        let mut watchers: Vec<(String, JoinHandle<BrokerResult<ServeReport>>)> = Vec::new();
        for queue in self.config.queues() {
            let server = QueueServer::new(queue, self.broker.clone(), handler.clone());
            let name = server.name().to_string();
            let shutdown = shutdown_rx.clone();
            let handle = tokio::spawn(async move { server.listen_and_serve(shutdown).await });
            watchers.push((name, handle));
        }
        info!(queues = watchers.len(), "queue watchers started");

        // ── Status registration ──────────────────────────────────
        let registration = register_status(self.coordinator.as_ref(), &lifecycle, &self.config);

        // ── Wait for shutdown ────────────────────────────────────
        if !*shutdown_rx.borrow_and_update() {
            tokio::select! {
                _ = signal => info!("shutdown signal received"),
                _ = shutdown_rx.changed() => info!("stop requested"),
            }
        }
        self.shutdown_tx.send_replace(true);

        let mut report = ShutdownReport {
            registration,
            queues: Vec::with_capacity(watchers.len()),
        };
        for (queue, handle) in watchers {
            let served = match handle.await {
                Ok(Ok(served)) => Some(served),
                Ok(Err(e)) => {
                    error!(%queue, error = %e, "queue watcher failed");
                    None
                }
                Err(e) => {
                    error!(%queue, error = %e, "queue watcher panicked");
                    None
                }
            };
            report.queues.push((queue, served));
        }
        if let Err(e) = event_log.await {
            error!(error = %e, "event log panicked");
        }

        info!("gulpd stopped");
        Ok(report)
    }
}

/// Log every status event until shutdown.
fn spawn_event_log(
    mut events: broadcast::Receiver<Event>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => info!(
                        account_id = %event.account_id,
                        event_type = event.data.metadata.get(keys::EVENT_TYPE).map(String::as_str).unwrap_or_default(),
                        description = %event.data.description,
                        "status event"
                    ),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event log lagging");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.changed() => break,
            }
        }
        debug!("event log stopped");
    })
}
