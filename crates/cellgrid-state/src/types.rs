//! Persisted infra records.
//!
//! Resource metadata is stored as the `cell-core` model types directly.
//! Host-level resources are tracked as `InfraRecord`s so a backend can
//! answer existence predicates and sweep orphans after partial failures.

use serde::{Deserialize, Serialize};

/// Kind of host-level resource an infra record tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfraKind {
    /// Control-group scope.
    Cgroup,
    /// Container-runtime namespace.
    Namespace,
    /// CNI network config list (and its IPAM allocations).
    CniConfig,
    /// Runtime task backing a container.
    Task,
}

impl InfraKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            InfraKind::Cgroup => "cgroup",
            InfraKind::Namespace => "namespace",
            InfraKind::CniConfig => "cni",
            InfraKind::Task => "task",
        }
    }

    /// Table key for the resource identified by `identity`.
    pub fn key(&self, identity: &str) -> String {
        format!("{}:{}", self.prefix(), identity)
    }
}

/// Lifecycle state of a host-level resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfraState {
    Created,
    Running,
    Stopped,
}

/// A host-level resource owned by a metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfraRecord {
    pub kind: InfraKind,
    /// Host identity: cgroup path, namespace name, config path, or task id.
    pub identity: String,
    /// Metadata key of the owning resource (`{realm}/{space}/...`).
    pub owner: String,
    pub state: InfraState,
    /// Unix timestamp (seconds) when the record was created.
    pub created_at: u64,
    /// Unix timestamp (seconds) of the last state change.
    pub updated_at: u64,
}

impl InfraRecord {
    pub fn new(kind: InfraKind, identity: impl Into<String>, owner: impl Into<String>, now: u64) -> Self {
        Self {
            kind,
            identity: identity.into(),
            owner: owner.into(),
            state: InfraState::Created,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the composite key for the infra table.
    pub fn table_key(&self) -> String {
        self.kind.key(&self.identity)
    }

    /// Whether this record belongs to `owner` or to anything beneath it.
    pub fn owned_by(&self, owner: &str) -> bool {
        self.owner == owner
            || (self.owner.starts_with(owner) && self.owner[owner.len()..].starts_with('/'))
    }
}
