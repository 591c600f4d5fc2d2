//! gulp-queue — message-broker plumbing for a gulp node.
//!
//! # Architecture
//!
//! ```text
//! Broker::consume(queue) ─► QueueServer::listen_and_serve
//!                              ├── ActionMessage::decode (bad payload → dropped)
//!                              └── ActionHandler::handle
//!                                    └── LifecycleHandler
//!                                          CartonBuilder::build → StatusSettable
//! ```
//!
//! One [`QueueServer`] runs per configured queue, each in its own task,
//! until the shared shutdown watch flips.

pub mod broker;
pub mod error;
pub mod handler;
pub mod message;
pub mod server;

pub use broker::{Broker, LocalBroker};
pub use error::{BrokerError, BrokerResult};
pub use handler::{ActionHandler, LifecycleHandler};
pub use message::{Action, ActionMessage};
pub use server::{QueueServer, ServeReport};
