pub mod config;
pub mod keys;
pub mod kvp;
pub mod types;

pub use config::{ConfigError, GulpConfig};
pub use kvp::{KvPair, Kvp};
pub use types::*;
