//! Inspection engine (Get).
//!
//! Resolves a resource's metadata through the runner and, when found,
//! aggregates the existence of its infra dependents. A runner NotFound is
//! reported as `metadata_exists = false` rather than as an error. The same
//! result types are the pre-state snapshots of create, delete and purge.

use serde::Serialize;
use tracing::debug;

use cell_core::{Cell, Container, Kind, NameChain, Realm, Space, Stack};
use cellgrid_runner::{Runner, RunnerError};

use crate::controller::Controller;
use crate::error::{ControllerError, ControllerResult, Operation};
use crate::validate;

#[derive(Debug, Clone, Serialize)]
pub struct GetRealmResult {
    pub realm: Realm,
    pub metadata_exists: bool,
    pub cgroup_exists: bool,
    pub namespace_exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetSpaceResult {
    pub space: Space,
    pub metadata_exists: bool,
    pub cgroup_exists: bool,
    pub cni_config_exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetStackResult {
    pub stack: Stack,
    pub metadata_exists: bool,
    pub cgroup_exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetCellResult {
    pub cell: Cell,
    pub metadata_exists: bool,
    pub cgroup_exists: bool,
    pub root_container_exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetContainerResult {
    pub container: Container,
    pub cell_metadata_exists: bool,
    pub container_exists: bool,
}

/// Map a runner lookup onto "found", "absent", or a wrapped failure.
fn found<T>(
    lookup: Result<T, RunnerError>,
    kind: Kind,
    chain: &NameChain,
) -> ControllerResult<Option<T>> {
    match lookup {
        Ok(resource) => Ok(Some(resource)),
        Err(e) if e.is_not_found() => {
            debug!(%kind, %chain, "metadata not found");
            Ok(None)
        }
        Err(e) => Err(ControllerError::runner(Operation::Get, kind, chain)(e)),
    }
}

impl<R: Runner> Controller<R> {
    pub fn get_realm(&self, realm: &Realm) -> ControllerResult<GetRealmResult> {
        let chain = validate::resolve(Kind::Realm, &realm.chain())?;
        self.inspect_realm(&chain)
    }

    pub fn get_space(&self, space: &Space) -> ControllerResult<GetSpaceResult> {
        let chain = validate::resolve(Kind::Space, &space.chain())?;
        self.inspect_space(&chain)
    }

    pub fn get_stack(&self, stack: &Stack) -> ControllerResult<GetStackResult> {
        let chain = validate::resolve(Kind::Stack, &stack.chain())?;
        self.inspect_stack(&chain)
    }

    pub fn get_cell(&self, cell: &Cell) -> ControllerResult<GetCellResult> {
        let chain = validate::resolve(Kind::Cell, &cell.chain())?;
        self.inspect_cell(&chain)
    }

    pub fn get_container(&self, container: &Container) -> ControllerResult<GetContainerResult> {
        let chain = validate::resolve(Kind::Container, &container.chain())?;
        self.inspect_container(&chain)
    }

    // ── Trimmed-chain inspection, shared by every engine ───────────

    pub(crate) fn inspect_realm(&self, chain: &NameChain) -> ControllerResult<GetRealmResult> {
        let runner = self.runner();
        let lookup = Realm::from_chain(chain);
        let Some(realm) = found(runner.get_realm(&lookup), Kind::Realm, chain)? else {
            return Ok(GetRealmResult {
                realm: lookup,
                metadata_exists: false,
                cgroup_exists: false,
                namespace_exists: false,
            });
        };
        let get = || ControllerError::runner(Operation::Get, Kind::Realm, chain);
        let cgroup_exists = runner.exists_cgroup(chain).map_err(get())?;
        let namespace_exists = runner
            .exists_namespace(realm.effective_namespace())
            .map_err(get())?;
        Ok(GetRealmResult {
            realm,
            metadata_exists: true,
            cgroup_exists,
            namespace_exists,
        })
    }

    pub(crate) fn inspect_space(&self, chain: &NameChain) -> ControllerResult<GetSpaceResult> {
        let runner = self.runner();
        let lookup = Space::from_chain(chain);
        let Some(space) = found(runner.get_space(&lookup), Kind::Space, chain)? else {
            return Ok(GetSpaceResult {
                space: lookup,
                metadata_exists: false,
                cgroup_exists: false,
                cni_config_exists: false,
            });
        };
        let get = || ControllerError::runner(Operation::Get, Kind::Space, chain);
        let cgroup_exists = runner.exists_cgroup(chain).map_err(get())?;
        let cni_config_exists = runner.exists_cni_config(&space).map_err(get())?;
        Ok(GetSpaceResult {
            space,
            metadata_exists: true,
            cgroup_exists,
            cni_config_exists,
        })
    }

    pub(crate) fn inspect_stack(&self, chain: &NameChain) -> ControllerResult<GetStackResult> {
        let runner = self.runner();
        let lookup = Stack::from_chain(chain);
        let Some(stack) = found(runner.get_stack(&lookup), Kind::Stack, chain)? else {
            return Ok(GetStackResult {
                stack: lookup,
                metadata_exists: false,
                cgroup_exists: false,
            });
        };
        let cgroup_exists = runner
            .exists_cgroup(chain)
            .map_err(ControllerError::runner(Operation::Get, Kind::Stack, chain))?;
        Ok(GetStackResult {
            stack,
            metadata_exists: true,
            cgroup_exists,
        })
    }

    pub(crate) fn inspect_cell(&self, chain: &NameChain) -> ControllerResult<GetCellResult> {
        let runner = self.runner();
        let lookup = Cell::from_chain(chain);
        let Some(cell) = found(runner.get_cell(&lookup), Kind::Cell, chain)? else {
            return Ok(GetCellResult {
                cell: lookup,
                metadata_exists: false,
                cgroup_exists: false,
                root_container_exists: false,
            });
        };
        let get = || ControllerError::runner(Operation::Get, Kind::Cell, chain);
        let cgroup_exists = runner.exists_cgroup(chain).map_err(get())?;
        let root_container_exists = runner.exists_root_container(&cell).map_err(get())?;
        Ok(GetCellResult {
            cell,
            metadata_exists: true,
            cgroup_exists,
            root_container_exists,
        })
    }

    /// Inspect a container. A missing cell is not an error: it is reported
    /// as `cell_metadata_exists = false` with no container.
    pub(crate) fn inspect_container(
        &self,
        chain: &NameChain,
    ) -> ControllerResult<GetContainerResult> {
        let runner = self.runner();
        let lookup = Container::from_chain(chain);
        let cell_chain = NameChain::cell(&chain.realm, &chain.space, &chain.stack, &chain.cell);
        let cell = found(
            runner.get_cell(&Cell::from_chain(&cell_chain)),
            Kind::Cell,
            &cell_chain,
        )?;
        if cell.is_none() {
            return Ok(GetContainerResult {
                container: lookup,
                cell_metadata_exists: false,
                container_exists: false,
            });
        }
        Ok(
            match found(runner.get_container(&lookup), Kind::Container, chain)? {
                Some(container) => GetContainerResult {
                    container,
                    cell_metadata_exists: true,
                    container_exists: true,
                },
                None => GetContainerResult {
                    container: lookup,
                    cell_metadata_exists: true,
                    container_exists: false,
                },
            },
        )
    }
}
