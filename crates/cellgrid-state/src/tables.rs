//! redb table definitions for the CellGrid state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized types).

use redb::TableDefinition;

/// Realm metadata keyed by `{realm}`.
pub const REALMS: TableDefinition<&str, &[u8]> = TableDefinition::new("realms");

/// Space metadata keyed by `{realm}/{space}`.
pub const SPACES: TableDefinition<&str, &[u8]> = TableDefinition::new("spaces");

/// Stack metadata keyed by `{realm}/{space}/{stack}`.
pub const STACKS: TableDefinition<&str, &[u8]> = TableDefinition::new("stacks");

/// Cell metadata (including the container list) keyed by
/// `{realm}/{space}/{stack}/{cell}`.
pub const CELLS: TableDefinition<&str, &[u8]> = TableDefinition::new("cells");

/// Host infra records keyed by `{kind}:{identity}`.
pub const INFRA: TableDefinition<&str, &[u8]> = TableDefinition::new("infra");
