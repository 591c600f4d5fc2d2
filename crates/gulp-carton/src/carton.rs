//! Carton — the deployable unit built for one deployment instance.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use gulp_core::{GulpConfig, State, Status};
use gulp_state::StateStore;

use crate::assembly::Assembler;
use crate::boxes::{BoxCompute, BoxSpec, BoxSsh};
use crate::component::ComponentResolver;
use crate::error::CartonResult;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Carton {
    /// Assembly id.
    pub id: String,
    /// Deployment instance id.
    pub cartons_id: String,
    pub name: String,
    pub tosca: String,
    pub image_version: String,
    pub domain_name: String,
    pub compute: BoxCompute,
    pub ssh: BoxSsh,
    pub provider: String,
    pub public_ip: String,
    pub boxes: Vec<BoxSpec>,
    pub status: Status,
    pub state: State,
}

/// Builds cartons from stored assemblies.
#[derive(Clone)]
pub struct CartonBuilder {
    assembler: Assembler,
    config: Arc<GulpConfig>,
}

impl CartonBuilder {
    pub fn new(store: StateStore, config: Arc<GulpConfig>) -> Self {
        Self {
            assembler: Assembler::new(store),
            config,
        }
    }

    pub fn with_resolver(
        store: StateStore,
        resolver: Arc<dyn ComponentResolver>,
        config: Arc<GulpConfig>,
    ) -> Self {
        Self {
            assembler: Assembler::with_resolver(store, resolver),
            config,
        }
    }

    /// Hydrate assembly `assembly_id` and turn it into a carton for the
    /// deployment instance `cartons_id`. No partial carton is returned.
    pub fn build(&self, cartons_id: &str, assembly_id: &str) -> CartonResult<Carton> {
        let asm = self.assembler.hydrate(assembly_id)?;
        let default_user = self.config.meta.user.as_str();
        let boxes = asm.mk_boxes(cartons_id, default_user)?;

        let carton = Carton {
            id: asm.id.clone(),
            cartons_id: cartons_id.to_string(),
            name: asm.name.clone(),
            tosca: asm.tosca_type.clone(),
            image_version: asm.image_version(),
            domain_name: asm.domain(),
            compute: asm.new_compute(),
            ssh: asm.new_ssh(default_user),
            provider: asm.provider(),
            public_ip: asm.public_ip(),
            boxes,
            status: asm.status.clone(),
            state: asm.state.clone(),
        };
        debug!(id = %carton.id, cartons_id, boxes = carton.boxes.len(), "carton built");
        Ok(carton)
    }
}
