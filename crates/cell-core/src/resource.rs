//! Resource hierarchy types.
//!
//! Each resource carries `Metadata` (name + labels), a `Spec` holding the
//! ownership fields that point at its parents by name, and a `Status`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::NameChain;

/// Lineage label carrying the owning realm's name.
pub const LABEL_REALM: &str = "cellgrid.io/realm";
/// Lineage label carrying the owning space's name.
pub const LABEL_SPACE: &str = "cellgrid.io/space";
/// Lineage label carrying the owning stack's name.
pub const LABEL_STACK: &str = "cellgrid.io/stack";
/// Lineage label carrying the owning cell's name.
pub const LABEL_CELL: &str = "cellgrid.io/cell";

/// Container id used for a cell's root container when none is declared.
pub const DEFAULT_ROOT_CONTAINER_ID: &str = "root";

// ── Kind ──────────────────────────────────────────────────────────

/// The five resource kinds, root to leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Realm,
    Space,
    Stack,
    Cell,
    Container,
}

impl Kind {
    /// All kinds in forward (parent-first) dependency order.
    pub const ALL: [Kind; 5] = [Kind::Realm, Kind::Space, Kind::Stack, Kind::Cell, Kind::Container];

    /// Depth in the hierarchy (Realm = 0, Container = 4).
    pub fn depth(&self) -> u8 {
        match self {
            Kind::Realm => 0,
            Kind::Space => 1,
            Kind::Stack => 2,
            Kind::Cell => 3,
            Kind::Container => 4,
        }
    }

    /// The kind of this kind's direct children.
    pub fn child(&self) -> Option<Kind> {
        match self {
            Kind::Realm => Some(Kind::Space),
            Kind::Space => Some(Kind::Stack),
            Kind::Stack => Some(Kind::Cell),
            Kind::Cell => Some(Kind::Container),
            Kind::Container => None,
        }
    }

    /// The manifest `kind` string (`"Realm"`, `"Space"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Realm => "Realm",
            Kind::Space => "Space",
            Kind::Stack => "Stack",
            Kind::Cell => "Cell",
            Kind::Container => "Container",
        }
    }

    /// Lower-case label used in messages and audit markers (`"space:s1"`).
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Realm => "realm",
            Kind::Space => "space",
            Kind::Stack => "stack",
            Kind::Cell => "cell",
            Kind::Container => "container",
        }
    }

    /// Parse a manifest `kind` string, case-insensitively.
    pub fn parse(s: &str) -> Option<Kind> {
        Kind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Metadata ──────────────────────────────────────────────────────

/// Name and labels shared by every resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Metadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: HashMap::new(),
        }
    }
}

// ── Realm ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Realm {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: RealmSpec,
    #[serde(default)]
    pub status: RealmStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealmSpec {
    /// Container-runtime namespace. Blank means "same as the realm name".
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealmStatus {
    pub state: RealmState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealmState {
    #[default]
    Unknown,
    Creating,
    Ready,
    Deleting,
    Failed,
}

impl Realm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::named(name),
            ..Default::default()
        }
    }

    /// Minimal lookup resource for the realm named by `chain`.
    pub fn from_chain(chain: &NameChain) -> Self {
        Self::new(chain.realm.clone())
    }

    pub fn chain(&self) -> NameChain {
        NameChain::realm(&self.metadata.name)
    }

    /// The runtime namespace, falling back to the realm name.
    pub fn effective_namespace(&self) -> &str {
        let ns = self.spec.namespace.trim();
        if ns.is_empty() {
            self.metadata.name.trim()
        } else {
            ns
        }
    }
}

// ── Space ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: SpaceSpec,
    #[serde(default)]
    pub status: SpaceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceSpec {
    pub realm_name: String,
    /// Path of the CNI network config list. Blank lets the runner choose.
    #[serde(default)]
    pub cni_config_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceStatus {
    pub state: SpaceState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceState {
    #[default]
    Unknown,
    Ready,
    Failed,
}

impl Space {
    pub fn new(realm: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: Metadata::named(name),
            spec: SpaceSpec {
                realm_name: realm.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn from_chain(chain: &NameChain) -> Self {
        Self::new(chain.realm.clone(), chain.space.clone())
    }

    pub fn chain(&self) -> NameChain {
        NameChain::space(&self.spec.realm_name, &self.metadata.name)
    }
}

// ── Stack ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: StackSpec,
    #[serde(default)]
    pub status: StackStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackSpec {
    #[serde(default)]
    pub id: String,
    pub realm_name: String,
    pub space_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackStatus {
    pub state: StackState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackState {
    #[default]
    Unknown,
    Ready,
    Failed,
}

impl Stack {
    pub fn new(
        realm: impl Into<String>,
        space: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            metadata: Metadata::named(name),
            spec: StackSpec {
                id: String::new(),
                realm_name: realm.into(),
                space_name: space.into(),
            },
            ..Default::default()
        }
    }

    pub fn from_chain(chain: &NameChain) -> Self {
        Self::new(chain.realm.clone(), chain.space.clone(), chain.stack.clone())
    }

    pub fn chain(&self) -> NameChain {
        NameChain::stack(
            &self.spec.realm_name,
            &self.spec.space_name,
            &self.metadata.name,
        )
    }
}

// ── Cell ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: CellSpec,
    #[serde(default)]
    pub status: CellStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    #[serde(default)]
    pub id: String,
    pub realm_name: String,
    pub space_name: String,
    pub stack_name: String,
    /// Id of the container that owns the cell's shared namespaces.
    #[serde(default)]
    pub root_container_id: String,
    /// Ordered container list; at most one entry is the root container.
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStatus {
    pub state: CellState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    #[default]
    Pending,
    Ready,
    Stopped,
    Failed,
    Unknown,
}

impl Cell {
    pub fn new(
        realm: impl Into<String>,
        space: impl Into<String>,
        stack: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            metadata: Metadata::named(name),
            spec: CellSpec {
                realm_name: realm.into(),
                space_name: space.into(),
                stack_name: stack.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn from_chain(chain: &NameChain) -> Self {
        Self::new(
            chain.realm.clone(),
            chain.space.clone(),
            chain.stack.clone(),
            chain.cell.clone(),
        )
    }

    pub fn chain(&self) -> NameChain {
        NameChain::cell(
            &self.spec.realm_name,
            &self.spec.space_name,
            &self.spec.stack_name,
            &self.metadata.name,
        )
    }

    /// Id of the root container, falling back to the root-flagged entry and
    /// then to [`DEFAULT_ROOT_CONTAINER_ID`].
    pub fn root_container_id(&self) -> &str {
        let declared = self.spec.root_container_id.trim();
        if !declared.is_empty() {
            return declared;
        }
        self.spec
            .containers
            .iter()
            .find(|c| c.root && !c.id.trim().is_empty())
            .map(|c| c.id.trim())
            .unwrap_or(DEFAULT_ROOT_CONTAINER_ID)
    }

    /// Find a container spec by id.
    pub fn container(&self, id: &str) -> Option<&ContainerSpec> {
        self.spec.containers.iter().find(|c| c.id == id)
    }
}

// ── Container ─────────────────────────────────────────────────────

/// Container definition as listed in a cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub realm_name: String,
    #[serde(default)]
    pub space_name: String,
    #[serde(default)]
    pub stack_name: String,
    #[serde(default)]
    pub cell_name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<String>,
    /// Marks the cell's root container.
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub cni_config_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: ContainerSpec,
    #[serde(default)]
    pub status: ContainerStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub state: ContainerState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerState {
    #[default]
    Pending,
    Ready,
    Stopped,
    Failed,
    Unknown,
}

impl Container {
    pub fn new(
        realm: impl Into<String>,
        space: impl Into<String>,
        stack: impl Into<String>,
        cell: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            metadata: Metadata::named(name.clone()),
            spec: ContainerSpec {
                id: name,
                realm_name: realm.into(),
                space_name: space.into(),
                stack_name: stack.into(),
                cell_name: cell.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn from_chain(chain: &NameChain) -> Self {
        Self::new(
            chain.realm.clone(),
            chain.space.clone(),
            chain.stack.clone(),
            chain.cell.clone(),
            chain.container.clone(),
        )
    }

    /// Wrap a spec listed in a cell as a standalone container resource.
    pub fn from_spec(spec: &ContainerSpec) -> Self {
        Self {
            metadata: Metadata::named(spec.id.clone()),
            spec: spec.clone(),
            status: ContainerStatus::default(),
        }
    }

    pub fn chain(&self) -> NameChain {
        NameChain::container(
            &self.spec.realm_name,
            &self.spec.space_name,
            &self.spec.stack_name,
            &self.spec.cell_name,
            &self.metadata.name,
        )
    }

    /// The id this container is listed under in its cell.
    pub fn id(&self) -> &str {
        let id = self.spec.id.trim();
        if id.is_empty() {
            self.metadata.name.trim()
        } else {
            id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_ordering_follows_hierarchy() {
        let depths: Vec<u8> = Kind::ALL.iter().map(Kind::depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 4]);
        assert_eq!(Kind::Realm.child(), Some(Kind::Space));
        assert_eq!(Kind::Container.child(), None);
    }

    #[test]
    fn kind_parse_is_case_insensitive() {
        assert_eq!(Kind::parse("realm"), Some(Kind::Realm));
        assert_eq!(Kind::parse(" Container "), Some(Kind::Container));
        assert_eq!(Kind::parse("pod"), None);
    }

    #[test]
    fn realm_namespace_defaults_to_name() {
        let mut realm = Realm::new("r1");
        assert_eq!(realm.effective_namespace(), "r1");
        realm.spec.namespace = "ctr-ns".to_string();
        assert_eq!(realm.effective_namespace(), "ctr-ns");
    }

    #[test]
    fn root_container_id_resolution() {
        let mut cell = Cell::new("r", "s", "st", "c");
        assert_eq!(cell.root_container_id(), DEFAULT_ROOT_CONTAINER_ID);

        cell.spec.containers.push(ContainerSpec {
            id: "pause".to_string(),
            root: true,
            ..Default::default()
        });
        assert_eq!(cell.root_container_id(), "pause");

        cell.spec.root_container_id = "explicit".to_string();
        assert_eq!(cell.root_container_id(), "explicit");
    }

    #[test]
    fn chains_carry_parent_names() {
        let container = Container::new("r", "s", "st", "c", "web");
        let chain = container.chain();
        assert_eq!(chain.realm, "r");
        assert_eq!(chain.cell, "c");
        assert_eq!(chain.container, "web");
        assert_eq!(container.id(), "web");
    }
}
