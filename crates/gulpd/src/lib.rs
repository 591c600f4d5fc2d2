//! gulpd — the gulp node daemon.
//!
//! Runs next to one deployed assembly: checks its dependencies, listens on
//! the node's action queues, registers the node with the coordination
//! service and marks the assembly `Running`.

pub mod checker;
pub mod server;

pub use checker::{CheckError, Checker};
pub use server::{Server, ServerError, ServerHandle, ShutdownReport};
