//! gulp-state — record store for the gulp agent.
//!
//! Backed by [redb](https://docs.rs/redb), holds the assembly and component
//! records written by the control plane plus the coordination registry.
//!
//! # Architecture
//!
//! Records are JSON-serialized into redb's `&[u8]` value columns and keyed
//! by id. Inputs, outputs and envs are typed [`gulp_core::Kvp`] values
//! serialized with the record, so a record decodes entirely or not at all.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
