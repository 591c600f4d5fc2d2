//! gulp-cluster — coordination-service plumbing for a gulp node.
//!
//! # Architecture
//!
//! ```text
//! register_status
//!   ├── Coordinator::sync_cluster()       refresh members (advisory)
//!   ├── membership::check_member(url)     scheme + host (advisory)
//!   ├── Coordinator::create(/dir/name)    {"id", "status": "RUNNING"}
//!   └── Lifecycle::set_status_by_id       local assembly → Running
//! ```
//!
//! [`StoreCoordinator`] keeps the coordination registry in the node's own
//! `StateStore`; member endpoints come from configuration.

pub mod coordinator;
pub mod error;
pub mod membership;
pub mod registration;

pub use coordinator::{Coordinator, StoreCoordinator};
pub use error::{ClusterError, ClusterResult};
pub use membership::{Member, check_member};
pub use registration::{NODE_STATUS_RUNNING, Registration, register_status};
