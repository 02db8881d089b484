//! Create/Ensure reconciler.
//!
//! `create_<kind>` is idempotent. Names are validated and trimmed, lineage
//! labels stamped, and the parent must already exist. An absent resource
//! is created with all of its infra. A present one is ensured: the runner
//! creates only the infra pieces that are missing, and each piece reports
//! `created = !exists_pre && exists_post` on its own.
//!
//! A runner failure aborts the call. Infra applied before the failure is
//! left for the runner to roll back.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use cell_core::{Cell, CellState, Container, Kind, NameChain, Realm, Space, Stack};
use cellgrid_runner::Runner;

use crate::controller::Controller;
use crate::error::{ControllerError, ControllerResult, Operation};
use crate::validate;

#[derive(Debug, Clone, Serialize)]
pub struct CreateRealmResult {
    pub realm: Realm,
    pub metadata_exists_pre: bool,
    pub metadata_exists_post: bool,
    pub created: bool,
    pub cgroup_exists_pre: bool,
    pub cgroup_exists_post: bool,
    pub cgroup_created: bool,
    pub namespace_exists_pre: bool,
    pub namespace_exists_post: bool,
    pub namespace_created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSpaceResult {
    pub space: Space,
    pub metadata_exists_pre: bool,
    pub metadata_exists_post: bool,
    pub created: bool,
    pub cgroup_exists_pre: bool,
    pub cgroup_exists_post: bool,
    pub cgroup_created: bool,
    pub cni_config_exists_pre: bool,
    pub cni_config_exists_post: bool,
    pub cni_config_created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateStackResult {
    pub stack: Stack,
    pub metadata_exists_pre: bool,
    pub metadata_exists_post: bool,
    pub created: bool,
    pub cgroup_exists_pre: bool,
    pub cgroup_exists_post: bool,
    pub cgroup_created: bool,
}

/// Per-container outcome of a cell create/ensure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerOutcome {
    pub id: String,
    pub exists_pre: bool,
    pub exists_post: bool,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCellResult {
    pub cell: Cell,
    pub metadata_exists_pre: bool,
    pub metadata_exists_post: bool,
    pub created: bool,
    pub cgroup_exists_pre: bool,
    pub cgroup_exists_post: bool,
    pub cgroup_created: bool,
    pub root_container_exists_pre: bool,
    pub root_container_exists_post: bool,
    pub root_container_created: bool,
    pub containers: Vec<ContainerOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateContainerResult {
    pub container: Container,
    pub container_exists_pre: bool,
    pub container_exists_post: bool,
    pub created: bool,
    pub started: bool,
}

/// An infra piece counts as created when it was absent before and present after.
fn converged(pre: bool, post: bool) -> bool {
    !pre && post
}

/// Non-blank container ids listed in a cell.
fn container_ids(cell: &Cell) -> HashSet<&str> {
    cell.spec
        .containers
        .iter()
        .map(|c| c.id.trim())
        .filter(|id| !id.is_empty())
        .collect()
}

impl<R: Runner> Controller<R> {
    /// Fail with the parent kind's NotFound unless the parent of `chain`
    /// has metadata.
    pub(crate) fn require_parent(&self, chain: &NameChain) -> ControllerResult<()> {
        let Some(parent) = chain.parent() else {
            return Ok(());
        };
        let exists = match parent.kind() {
            Kind::Realm => self.inspect_realm(&parent)?.metadata_exists,
            Kind::Space => self.inspect_space(&parent)?.metadata_exists,
            Kind::Stack => self.inspect_stack(&parent)?.metadata_exists,
            Kind::Cell => self.inspect_cell(&parent)?.metadata_exists,
            Kind::Container => true,
        };
        if exists {
            Ok(())
        } else {
            Err(ControllerError::not_found(parent.kind(), &parent))
        }
    }

    pub fn create_realm(&self, realm: &Realm) -> ControllerResult<CreateRealmResult> {
        let (realm, chain) = validate::realm(realm)?;
        let _session = self.session(Operation::Create, Kind::Realm, &chain)?;
        let create = || ControllerError::runner(Operation::Create, Kind::Realm, &chain);

        let pre = self.inspect_realm(&chain)?;
        if !pre.metadata_exists {
            let realm = self.runner().create_realm(&realm).map_err(create())?;
            info!(%chain, namespace = %realm.effective_namespace(), "realm created");
            return Ok(CreateRealmResult {
                realm,
                metadata_exists_pre: false,
                metadata_exists_post: true,
                created: true,
                cgroup_exists_pre: false,
                cgroup_exists_post: true,
                cgroup_created: true,
                namespace_exists_pre: false,
                namespace_exists_post: true,
                namespace_created: true,
            });
        }

        let realm = self.runner().ensure_realm(&realm).map_err(create())?;
        let post = self.inspect_realm(&chain)?;
        info!(
            %chain,
            cgroup_created = converged(pre.cgroup_exists, post.cgroup_exists),
            namespace_created = converged(pre.namespace_exists, post.namespace_exists),
            "realm ensured"
        );
        Ok(CreateRealmResult {
            realm,
            metadata_exists_pre: true,
            metadata_exists_post: post.metadata_exists,
            created: false,
            cgroup_exists_pre: pre.cgroup_exists,
            cgroup_exists_post: post.cgroup_exists,
            cgroup_created: converged(pre.cgroup_exists, post.cgroup_exists),
            namespace_exists_pre: pre.namespace_exists,
            namespace_exists_post: post.namespace_exists,
            namespace_created: converged(pre.namespace_exists, post.namespace_exists),
        })
    }

    pub fn create_space(&self, space: &Space) -> ControllerResult<CreateSpaceResult> {
        let (space, chain) = validate::space(space)?;
        let _session = self.session(Operation::Create, Kind::Space, &chain)?;
        let create = || ControllerError::runner(Operation::Create, Kind::Space, &chain);

        self.require_parent(&chain)?;
        let pre = self.inspect_space(&chain)?;
        if !pre.metadata_exists {
            let space = self.runner().create_space(&space).map_err(create())?;
            info!(%chain, network = %chain.network_name(), "space created");
            return Ok(CreateSpaceResult {
                space,
                metadata_exists_pre: false,
                metadata_exists_post: true,
                created: true,
                cgroup_exists_pre: false,
                cgroup_exists_post: true,
                cgroup_created: true,
                cni_config_exists_pre: false,
                cni_config_exists_post: true,
                cni_config_created: true,
            });
        }

        let space = self.runner().ensure_space(&space).map_err(create())?;
        let post = self.inspect_space(&chain)?;
        info!(%chain, "space ensured");
        Ok(CreateSpaceResult {
            space,
            metadata_exists_pre: true,
            metadata_exists_post: post.metadata_exists,
            created: false,
            cgroup_exists_pre: pre.cgroup_exists,
            cgroup_exists_post: post.cgroup_exists,
            cgroup_created: converged(pre.cgroup_exists, post.cgroup_exists),
            cni_config_exists_pre: pre.cni_config_exists,
            cni_config_exists_post: post.cni_config_exists,
            cni_config_created: converged(pre.cni_config_exists, post.cni_config_exists),
        })
    }

    pub fn create_stack(&self, stack: &Stack) -> ControllerResult<CreateStackResult> {
        let (stack, chain) = validate::stack(stack)?;
        let _session = self.session(Operation::Create, Kind::Stack, &chain)?;
        let create = || ControllerError::runner(Operation::Create, Kind::Stack, &chain);

        self.require_parent(&chain)?;
        let pre = self.inspect_stack(&chain)?;
        if !pre.metadata_exists {
            let stack = self.runner().create_stack(&stack).map_err(create())?;
            info!(%chain, "stack created");
            return Ok(CreateStackResult {
                stack,
                metadata_exists_pre: false,
                metadata_exists_post: true,
                created: true,
                cgroup_exists_pre: false,
                cgroup_exists_post: true,
                cgroup_created: true,
            });
        }

        let stack = self.runner().ensure_stack(&stack).map_err(create())?;
        let post = self.inspect_stack(&chain)?;
        info!(%chain, "stack ensured");
        Ok(CreateStackResult {
            stack,
            metadata_exists_pre: true,
            metadata_exists_post: post.metadata_exists,
            created: false,
            cgroup_exists_pre: pre.cgroup_exists,
            cgroup_exists_post: post.cgroup_exists,
            cgroup_created: converged(pre.cgroup_exists, post.cgroup_exists),
        })
    }

    /// Create or ensure a cell, then start its containers and mark it Ready.
    pub fn create_cell(&self, cell: &Cell) -> ControllerResult<CreateCellResult> {
        let (cell, chain) = validate::cell(cell)?;
        let _session = self.session(Operation::Create, Kind::Cell, &chain)?;
        let create = || ControllerError::runner(Operation::Create, Kind::Cell, &chain);

        self.require_parent(&chain)?;
        let pre = self.inspect_cell(&chain)?;
        let ids_pre: HashSet<String> = if pre.metadata_exists {
            container_ids(&pre.cell)
                .into_iter()
                .map(str::to_string)
                .collect()
        } else {
            HashSet::new()
        };

        let provisioned = if pre.metadata_exists {
            self.runner().ensure_cell(&cell).map_err(create())?
        } else {
            self.runner().create_cell(&cell).map_err(create())?
        };
        let mut started = self.runner().start_cell(&provisioned).map_err(create())?;
        started.status.state = CellState::Ready;
        let cell = self
            .runner()
            .update_cell_metadata(&started)
            .map_err(create())?;

        let (cgroup_exists_post, root_container_exists_post) = if pre.metadata_exists {
            let post = self.inspect_cell(&chain)?;
            (post.cgroup_exists, post.root_container_exists)
        } else {
            (true, true)
        };

        let ids_post = container_ids(&cell);
        let containers: Vec<ContainerOutcome> = cell
            .spec
            .containers
            .iter()
            .map(|c| c.id.trim())
            .filter(|id| !id.is_empty())
            .map(|id| {
                let exists_pre = ids_pre.contains(id);
                let exists_post = ids_post.contains(id);
                ContainerOutcome {
                    id: id.to_string(),
                    exists_pre,
                    exists_post,
                    created: converged(exists_pre, exists_post),
                }
            })
            .collect();
        for outcome in containers.iter().filter(|o| o.created) {
            debug!(%chain, container = %outcome.id, "container added to cell");
        }
        info!(
            %chain,
            created = !pre.metadata_exists,
            containers = containers.len(),
            "cell reconciled and started"
        );

        Ok(CreateCellResult {
            metadata_exists_pre: pre.metadata_exists,
            metadata_exists_post: true,
            created: !pre.metadata_exists,
            cgroup_exists_pre: pre.cgroup_exists,
            cgroup_exists_post,
            cgroup_created: converged(pre.cgroup_exists, cgroup_exists_post),
            root_container_exists_pre: pre.root_container_exists,
            root_container_exists_post,
            root_container_created: converged(
                pre.root_container_exists,
                root_container_exists_post,
            ),
            containers,
            cell,
        })
    }

    /// Create or ensure a container inside an existing cell, then start it.
    pub fn create_container(&self, container: &Container) -> ControllerResult<CreateContainerResult> {
        let (container, chain) = validate::container(container)?;
        let _session = self.session(Operation::Create, Kind::Container, &chain)?;
        let create = || ControllerError::runner(Operation::Create, Kind::Container, &chain);

        self.require_parent(&chain)?;
        let pre = self.inspect_container(&chain)?;
        let provisioned = if pre.container_exists {
            self.runner().ensure_container(&container).map_err(create())?
        } else {
            self.runner().create_container(&container).map_err(create())?
        };
        let container = self
            .runner()
            .start_container(&provisioned)
            .map_err(create())?;
        info!(%chain, created = !pre.container_exists, "container reconciled and started");

        Ok(CreateContainerResult {
            container,
            container_exists_pre: pre.container_exists,
            container_exists_post: true,
            created: !pre.container_exists,
            started: true,
        })
    }
}
