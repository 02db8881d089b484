//! Name chains: the full parent path of a resource.
//!
//! A `NameChain` identifies a resource by the names of every level above it
//! plus its own. Unused levels are empty strings. Chains double as store
//! keys (`realm/space/stack/cell`) and as the source of derived host
//! identities (cgroup paths, CNI network names, runtime task ids).
//!
//! Those identities join names with `/` and `_`, so a name may only use
//! ASCII letters, digits, `-` and `.` (see [`check_name`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::{Kind, LABEL_CELL, LABEL_REALM, LABEL_SPACE, LABEL_STACK};

/// Why a name cannot be used at any level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("contains {0:?}; only ASCII letters, digits, '-' and '.' are allowed")]
    InvalidChar(char),
    #[error("is a reserved path segment")]
    Reserved,
}

/// Check a single, already trimmed, non-empty name.
pub fn check_name(name: &str) -> Result<(), NameError> {
    if name == "." || name == ".." {
        return Err(NameError::Reserved);
    }
    match name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
    {
        Some(c) => Err(NameError::InvalidChar(c)),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameChain {
    pub realm: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub space: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stack: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cell: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container: String,
}

impl NameChain {
    pub fn realm(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            ..Default::default()
        }
    }

    pub fn space(realm: impl Into<String>, space: impl Into<String>) -> Self {
        Self {
            space: space.into(),
            ..Self::realm(realm)
        }
    }

    pub fn stack(
        realm: impl Into<String>,
        space: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Self {
            stack: stack.into(),
            ..Self::space(realm, space)
        }
    }

    pub fn cell(
        realm: impl Into<String>,
        space: impl Into<String>,
        stack: impl Into<String>,
        cell: impl Into<String>,
    ) -> Self {
        Self {
            cell: cell.into(),
            ..Self::stack(realm, space, stack)
        }
    }

    pub fn container(
        realm: impl Into<String>,
        space: impl Into<String>,
        stack: impl Into<String>,
        cell: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            container: container.into(),
            ..Self::cell(realm, space, stack, cell)
        }
    }

    /// Populated levels, root first.
    pub fn components(&self) -> impl Iterator<Item = (Kind, &str)> {
        [
            (Kind::Realm, self.realm.as_str()),
            (Kind::Space, self.space.as_str()),
            (Kind::Stack, self.stack.as_str()),
            (Kind::Cell, self.cell.as_str()),
            (Kind::Container, self.container.as_str()),
        ]
        .into_iter()
        .take_while(|(_, name)| !name.is_empty())
    }

    /// Kind of the deepest populated level.
    pub fn kind(&self) -> Kind {
        self.components().last().map(|(k, _)| k).unwrap_or(Kind::Realm)
    }

    /// Name of the deepest populated level.
    pub fn name(&self) -> &str {
        self.components().last().map(|(_, n)| n).unwrap_or("")
    }

    /// The chain of the direct parent, if any.
    pub fn parent(&self) -> Option<NameChain> {
        let mut parent = self.clone();
        match self.kind() {
            Kind::Realm => return None,
            Kind::Space => parent.space.clear(),
            Kind::Stack => parent.stack.clear(),
            Kind::Cell => parent.cell.clear(),
            Kind::Container => parent.container.clear(),
        }
        Some(parent)
    }

    /// The chain of a direct child named `name`. A container chain has no
    /// children and is returned unchanged.
    pub fn child(&self, name: impl Into<String>) -> NameChain {
        let mut child = self.clone();
        let name = name.into();
        match self.kind() {
            Kind::Realm => child.space = name,
            Kind::Space => child.stack = name,
            Kind::Stack => child.cell = name,
            Kind::Cell => child.container = name,
            Kind::Container => {}
        }
        child
    }

    /// `/`-joined key of all populated levels (`r1/s1/st1`).
    pub fn key(&self) -> String {
        self.components()
            .map(|(_, n)| n)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Cgroup path relative to `root`, down to the cell level.
    pub fn cgroup_path(&self, root: &str) -> String {
        let mut path = root.trim_end_matches('/').to_string();
        for (kind, name) in self.components() {
            if kind == Kind::Container {
                break;
            }
            path.push('/');
            path.push_str(name);
        }
        path
    }

    /// CNI network name of the space this chain belongs to.
    pub fn network_name(&self) -> String {
        format!("{}_{}", self.realm, self.space)
    }

    /// Runtime task id for `container_id` inside the cell of this chain.
    pub fn task_id(&self, container_id: &str) -> String {
        format!(
            "{}_{}_{}_{}_{}",
            self.realm, self.space, self.stack, self.cell, container_id
        )
    }

    /// Copy of this chain with every level trimmed.
    pub fn trimmed(&self) -> NameChain {
        NameChain {
            realm: self.realm.trim().to_string(),
            space: self.space.trim().to_string(),
            stack: self.stack.trim().to_string(),
            cell: self.cell.trim().to_string(),
            container: self.container.trim().to_string(),
        }
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &NameChain) -> bool {
        let theirs: Vec<_> = other.components().collect();
        let mut depth = 0;
        for (kind, name) in self.components() {
            match theirs.get(depth) {
                Some((k, n)) if *k == kind && *n == name => depth += 1,
                _ => return false,
            }
        }
        depth > 0
    }

    /// Lineage labels implied by this chain (container level excluded).
    pub fn lineage_labels(&self) -> Vec<(&'static str, &str)> {
        self.components()
            .filter_map(|(kind, name)| {
                let key = match kind {
                    Kind::Realm => LABEL_REALM,
                    Kind::Space => LABEL_SPACE,
                    Kind::Stack => LABEL_STACK,
                    Kind::Cell => LABEL_CELL,
                    Kind::Container => return None,
                };
                Some((key, name))
            })
            .collect()
    }
}

impl fmt::Display for NameChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (kind, name) in self.components() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{kind}={name}")?;
            first = false;
        }
        Ok(())
    }
}
