//! redb table definitions for the gulp record store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized records).

use redb::TableDefinition;

/// Assembly records keyed by `{id}`.
pub const ASSEMBLIES: TableDefinition<&str, &[u8]> = TableDefinition::new("assemblies");

/// Component records keyed by `{id}`.
pub const COMPONENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("components");

/// Coordination registry entries keyed by path (`/{directory}/{name}`).
pub const REGISTRY: TableDefinition<&str, &[u8]> = TableDefinition::new("registry");

/// Scratch objects written by the connectivity smoke test.
pub const PROBES: TableDefinition<&str, &[u8]> = TableDefinition::new("probes");
