//! Action dispatch.

use async_trait::async_trait;
use tracing::{debug, info};

use gulp_carton::{CartonBuilder, CartonResult, Lifecycle, StatusSettable};

use crate::message::{Action, ActionMessage};

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, msg: &ActionMessage) -> CartonResult<()>;
}

/// Builds the targeted carton and walks it through the action's statuses.
///
/// Provisioning itself is out of scope: only status transitions are
/// recorded, each with its own event.
#[derive(Clone)]
pub struct LifecycleHandler {
    builder: CartonBuilder,
    lifecycle: Lifecycle,
}

impl LifecycleHandler {
    pub fn new(builder: CartonBuilder, lifecycle: Lifecycle) -> Self {
        Self { builder, lifecycle }
    }
}

#[async_trait]
impl ActionHandler for LifecycleHandler {
    async fn handle(&self, msg: &ActionMessage) -> CartonResult<()> {
        let mut carton = self.builder.build(&msg.cartons_id, &msg.cat_id)?;
        debug!(
            request = %msg.id,
            action = %msg.action,
            carton = %carton.id,
            boxes = carton.boxes.len(),
            "dispatching action"
        );

        if msg.action == Action::Addon {
            info!(request = %msg.id, carton = %carton.id, "addon requested, no status change");
            return Ok(());
        }

        for status in msg.action.transitions() {
            carton.set_status(&self.lifecycle, status)?;
        }
        info!(
            request = %msg.id,
            action = %msg.action,
            carton = %carton.id,
            status = %carton.status,
            "action handled"
        );
        Ok(())
    }
}
