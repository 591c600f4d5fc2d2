//! gulp-carton — turns an assembly into a deployable carton of boxes and
//! tracks its lifecycle.
//!
//! # Architecture
//!
//! ```text
//! StateStore (assembly + component records)
//!   └── Assembler        hydrate(id) → Assembly { components by id }
//!       └── CartonBuilder build(cartons_id, id) → Carton { boxes }
//!
//! Lifecycle
//!   ├── set_status → inputs upsert + persist + EventNotifier (one event)
//!   └── set_state  → persist only
//! ```
//!
//! Hydrated assemblies, cartons and boxes are request-scoped. Only status,
//! state, inputs and outputs go back to the store, through [`Lifecycle`].

pub mod assembly;
pub mod boxes;
pub mod carton;
pub mod component;
pub mod error;
pub mod events;
pub mod lifecycle;

pub use assembly::{Assembler, Assembly};
pub use boxes::{BoxCompute, BoxSpec, BoxSsh};
pub use carton::{Carton, CartonBuilder};
pub use component::ComponentResolver;
pub use error::{CartonError, CartonResult};
pub use events::{BroadcastEventBus, Event, EventBus, EventData, EventError, EventNotifier};
pub use gulp_core::{KvPair, Kvp};
pub use lifecycle::{Lifecycle, StatusSettable};
