//! Cascade delete engine.
//!
//! A delete requires the resource's metadata to exist. Its direct children
//! then go through the dependency gate:
//!
//! | cascade | force | behaviour                                          |
//! |---------|-------|----------------------------------------------------|
//! | true    | any   | delete every child first, depth-first              |
//! | false   | false | fail with `HasDependencies` if any child exists    |
//! | false   | true  | skip the check and leave children dangling         |
//!
//! A cell's containers are not gated: they always go with the cell.

use serde::Serialize;
use tracing::{debug, info};

use cell_core::{Cell, Container, Kind, NameChain, Realm, Space, Stack};
use cellgrid_runner::{Runner, RunnerResult};

use crate::controller::Controller;
use crate::error::{ControllerError, ControllerResult, Operation};
use crate::inspect::{
    GetCellResult, GetContainerResult, GetRealmResult, GetSpaceResult, GetStackResult,
};
use crate::validate;

/// Outcome of a delete: the pre-state snapshot and what was removed.
///
/// `deleted` lists cascaded children as `"<kind>:<name>"` followed by the
/// resource's own markers (`"metadata"`, `"cgroup"`, ...).
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult<P> {
    pub pre: P,
    pub deleted: Vec<String>,
}

pub type DeleteRealmResult = DeleteResult<GetRealmResult>;
pub type DeleteSpaceResult = DeleteResult<GetSpaceResult>;
pub type DeleteStackResult = DeleteResult<GetStackResult>;
pub type DeleteCellResult = DeleteResult<GetCellResult>;
pub type DeleteContainerResult = DeleteResult<GetContainerResult>;

/// Audit marker for a removed child.
pub(crate) fn child_marker(kind: Kind, name: &str) -> String {
    format!("{}:{}", kind.label(), name)
}

pub(crate) fn markers(names: &[&'static str]) -> Vec<String> {
    names.iter().map(|m| m.to_string()).collect()
}

impl<R: Runner> Controller<R> {
    pub fn delete_realm(
        &self,
        realm: &Realm,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<DeleteRealmResult> {
        let chain = validate::resolve(Kind::Realm, &realm.chain())?;
        let _session = self.session(Operation::Delete, Kind::Realm, &chain)?;
        self.delete_realm_inner(&chain, force, cascade)
    }

    pub fn delete_space(
        &self,
        space: &Space,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<DeleteSpaceResult> {
        let chain = validate::resolve(Kind::Space, &space.chain())?;
        let _session = self.session(Operation::Delete, Kind::Space, &chain)?;
        self.delete_space_inner(&chain, force, cascade)
    }

    pub fn delete_stack(
        &self,
        stack: &Stack,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<DeleteStackResult> {
        let chain = validate::resolve(Kind::Stack, &stack.chain())?;
        let _session = self.session(Operation::Delete, Kind::Stack, &chain)?;
        self.delete_stack_inner(&chain, force, cascade)
    }

    /// Delete a cell and, unconditionally, all of its containers.
    pub fn delete_cell(&self, cell: &Cell) -> ControllerResult<DeleteCellResult> {
        let chain = validate::resolve(Kind::Cell, &cell.chain())?;
        let _session = self.session(Operation::Delete, Kind::Cell, &chain)?;
        self.delete_cell_inner(&chain)
    }

    pub fn delete_container(&self, container: &Container) -> ControllerResult<DeleteContainerResult> {
        let chain = validate::resolve(Kind::Container, &container.chain())?;
        let _session = self.session(Operation::Delete, Kind::Container, &chain)?;
        self.delete_container_inner(&chain)
    }

    // ── Dependency gate ────────────────────────────────────────────

    /// Names of the direct children of `chain`.
    pub(crate) fn child_names(&self, chain: &NameChain) -> RunnerResult<Vec<String>> {
        let runner = self.runner();
        let names: Vec<String> = match chain.kind() {
            Kind::Realm => runner
                .list_spaces(&chain.realm)?
                .into_iter()
                .map(|s| s.metadata.name)
                .collect(),
            Kind::Space => runner
                .list_stacks(&chain.realm, &chain.space)?
                .into_iter()
                .map(|s| s.metadata.name)
                .collect(),
            Kind::Stack => runner
                .list_cells(&chain.realm, &chain.space, &chain.stack)?
                .into_iter()
                .map(|c| c.metadata.name)
                .collect(),
            Kind::Cell => runner
                .list_containers(&chain.realm, &chain.space, &chain.stack, &chain.cell)?
                .into_iter()
                .map(|c| c.id)
                .collect(),
            Kind::Container => Vec::new(),
        };
        Ok(names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect())
    }

    /// Fail if `chain` has any direct child.
    pub(crate) fn check_dependencies(
        &self,
        chain: &NameChain,
        children: &[String],
    ) -> ControllerResult<()> {
        if children.is_empty() {
            return Ok(());
        }
        let kind = chain.kind();
        Err(ControllerError::HasDependencies {
            kind,
            name: chain.name().to_string(),
            chain: chain.clone(),
            child: kind.child().unwrap_or(kind),
            count: children.len(),
        })
    }

    /// Children to cascade over, or none after a passing dependency check.
    ///
    /// A parent whose metadata is already gone has no children.
    pub(crate) fn gate(
        &self,
        chain: &NameChain,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<Vec<String>> {
        if !cascade && force {
            debug!(%chain, "force: dependency check skipped");
            return Ok(Vec::new());
        }
        let child_kind = chain.kind().child().unwrap_or(Kind::Container);
        let children = match self.child_names(chain) {
            Ok(children) => children,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(ControllerError::runner(Operation::List, child_kind, chain)(e)),
        };
        if cascade {
            return Ok(children);
        }
        self.check_dependencies(chain, &children)?;
        Ok(Vec::new())
    }

    // ── Per-kind deletion on trimmed chains ────────────────────────

    pub(crate) fn delete_realm_inner(
        &self,
        chain: &NameChain,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<DeleteRealmResult> {
        let pre = self.inspect_realm(chain)?;
        if !pre.metadata_exists {
            return Err(ControllerError::not_found(Kind::Realm, chain));
        }

        let mut deleted = Vec::new();
        for space in self.gate(chain, force, cascade)? {
            self.delete_space_inner(&chain.child(space.as_str()), force, cascade)?;
            deleted.push(child_marker(Kind::Space, &space));
        }

        self.runner()
            .delete_realm(&pre.realm)
            .map_err(ControllerError::runner(Operation::Delete, Kind::Realm, chain))?;
        deleted.extend(markers(&["metadata", "cgroup", "namespace"]));
        info!(%chain, cascaded = deleted.len() - 3, "realm deleted");
        Ok(DeleteResult { pre, deleted })
    }

    pub(crate) fn delete_space_inner(
        &self,
        chain: &NameChain,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<DeleteSpaceResult> {
        let pre = self.inspect_space(chain)?;
        if !pre.metadata_exists {
            return Err(ControllerError::not_found(Kind::Space, chain));
        }

        let mut deleted = Vec::new();
        for stack in self.gate(chain, force, cascade)? {
            self.delete_stack_inner(&chain.child(stack.as_str()), force, cascade)?;
            deleted.push(child_marker(Kind::Stack, &stack));
        }

        self.runner()
            .delete_space(&pre.space)
            .map_err(ControllerError::runner(Operation::Delete, Kind::Space, chain))?;
        deleted.extend(markers(&["metadata", "cgroup", "network"]));
        info!(%chain, "space deleted");
        Ok(DeleteResult { pre, deleted })
    }

    pub(crate) fn delete_stack_inner(
        &self,
        chain: &NameChain,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<DeleteStackResult> {
        let pre = self.inspect_stack(chain)?;
        if !pre.metadata_exists {
            return Err(ControllerError::not_found(Kind::Stack, chain));
        }

        let mut deleted = Vec::new();
        for cell in self.gate(chain, force, cascade)? {
            self.delete_cell_inner(&chain.child(cell.as_str()))?;
            deleted.push(child_marker(Kind::Cell, &cell));
        }

        self.runner()
            .delete_stack(&pre.stack)
            .map_err(ControllerError::runner(Operation::Delete, Kind::Stack, chain))?;
        deleted.extend(markers(&["metadata", "cgroup"]));
        info!(%chain, "stack deleted");
        Ok(DeleteResult { pre, deleted })
    }

    pub(crate) fn delete_cell_inner(&self, chain: &NameChain) -> ControllerResult<DeleteCellResult> {
        let pre = self.inspect_cell(chain)?;
        if !pre.metadata_exists {
            return Err(ControllerError::not_found(Kind::Cell, chain));
        }

        let root = pre.cell.root_container_id().to_string();
        let mut deleted = Vec::new();
        for spec in &pre.cell.spec.containers {
            let id = spec.id.trim();
            if id.is_empty() || id == root {
                continue;
            }
            let container_chain = chain.child(id);
            match self
                .runner()
                .delete_container(&Container::from_chain(&container_chain))
            {
                Ok(()) => deleted.push(child_marker(Kind::Container, id)),
                Err(e) if e.is_not_found() => {
                    debug!(chain = %container_chain, "container already gone");
                }
                Err(e) => {
                    return Err(ControllerError::runner(
                        Operation::Delete,
                        Kind::Container,
                        &container_chain,
                    )(e));
                }
            }
        }

        self.runner()
            .delete_cell(&pre.cell)
            .map_err(ControllerError::runner(Operation::Delete, Kind::Cell, chain))?;
        deleted.extend(markers(&["metadata", "cgroup", "root-container"]));
        info!(%chain, "cell deleted");
        Ok(DeleteResult { pre, deleted })
    }

    pub(crate) fn delete_container_inner(
        &self,
        chain: &NameChain,
    ) -> ControllerResult<DeleteContainerResult> {
        let pre = self.inspect_container(chain)?;
        if !pre.cell_metadata_exists {
            return Err(ControllerError::not_found(
                Kind::Cell,
                &chain.parent().unwrap_or_else(|| chain.clone()),
            ));
        }
        if !pre.container_exists {
            return Err(ControllerError::not_found(Kind::Container, chain));
        }

        self.runner()
            .delete_container(&pre.container)
            .map_err(ControllerError::runner(Operation::Delete, Kind::Container, chain))?;
        info!(%chain, "container deleted");
        Ok(DeleteResult {
            pre,
            deleted: markers(&["metadata", "task"]),
        })
    }
}
