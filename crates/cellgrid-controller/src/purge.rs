//! Purge engine: delete plus unconditional deep clean.
//!
//! Purge is the recovery path for interrupted deletes, so it never stops
//! at missing metadata:
//!
//! 1. With `cascade`, children are purged first, depth-first.
//! 2. Without `cascade` or `force`, the dependency check of a delete applies.
//! 3. If metadata exists, the standard delete runs (`force`, no cascade).
//!    A failure there is recorded as `delete-warning:<err>` and purge moves on.
//! 4. The runner's `purge_<kind>` always runs. Success appends descriptive
//!    tags; failure is recorded as `purge-error:<err>` and clears
//!    `purge_succeeded`, but the call itself still returns `Ok`.

use serde::Serialize;
use tracing::{info, warn};

use cell_core::{Cell, Container, Kind, NameChain, Realm, Space, Stack};
use cellgrid_runner::{Runner, RunnerResult};

use crate::controller::Controller;
use crate::delete::{child_marker, markers};
use crate::error::{ControllerError, ControllerResult, Operation};
use crate::inspect::{
    GetCellResult, GetContainerResult, GetRealmResult, GetSpaceResult, GetStackResult,
};
use crate::validate;

/// Tags appended after a successful deep clean of a realm, space, stack or cell.
pub const SCOPE_PURGE_TAGS: [&str; 3] = ["cni-resources", "orphaned-containers", "all-metadata"];

/// Tags appended after a successful deep clean of a container.
pub const CONTAINER_PURGE_TAGS: [&str; 3] = ["cni-resources", "ipam-allocation", "cache-entries"];

/// Outcome of a purge.
///
/// `purged` holds, in order: cascaded children (`"<kind>:<name>"`), the
/// delete step's markers or its `delete-warning:`, then the deep-clean tags
/// or its `purge-error:`.
#[derive(Debug, Clone, Serialize)]
pub struct PurgeResult<P> {
    pub pre: P,
    pub purged: Vec<String>,
    pub purge_succeeded: bool,
}

pub type PurgeRealmResult = PurgeResult<GetRealmResult>;
pub type PurgeSpaceResult = PurgeResult<GetSpaceResult>;
pub type PurgeStackResult = PurgeResult<GetStackResult>;
pub type PurgeCellResult = PurgeResult<GetCellResult>;
pub type PurgeContainerResult = PurgeResult<GetContainerResult>;

/// Fold the delete step into the purge record, downgrading failure.
fn record_delete(outcome: ControllerResult<Vec<String>>, chain: &NameChain, purged: &mut Vec<String>) {
    match outcome {
        Ok(deleted) => purged.extend(deleted),
        Err(e) => {
            warn!(%chain, error = %e, "delete step failed, continuing with deep clean");
            purged.push(format!("delete-warning:{e}"));
        }
    }
}

/// Fold the deep-clean step into the purge record. Returns whether it succeeded.
fn record_deep_clean(
    outcome: RunnerResult<()>,
    kind: Kind,
    chain: &NameChain,
    tags: &[&'static str],
    purged: &mut Vec<String>,
) -> bool {
    match outcome {
        Ok(()) => {
            purged.extend(markers(tags));
            info!(%chain, "{kind} purged");
            true
        }
        Err(e) => {
            let err = ControllerError::runner(Operation::Purge, kind, chain)(e);
            warn!(%chain, error = %err, "deep clean failed");
            purged.push(format!("purge-error:{err}"));
            false
        }
    }
}

impl<R: Runner> Controller<R> {
    pub fn purge_realm(
        &self,
        realm: &Realm,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<PurgeRealmResult> {
        let chain = validate::resolve(Kind::Realm, &realm.chain())?;
        let _session = self.session(Operation::Purge, Kind::Realm, &chain)?;
        self.purge_realm_inner(&chain, force, cascade)
    }

    pub fn purge_space(
        &self,
        space: &Space,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<PurgeSpaceResult> {
        let chain = validate::resolve(Kind::Space, &space.chain())?;
        let _session = self.session(Operation::Purge, Kind::Space, &chain)?;
        self.purge_space_inner(&chain, force, cascade)
    }

    pub fn purge_stack(
        &self,
        stack: &Stack,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<PurgeStackResult> {
        let chain = validate::resolve(Kind::Stack, &stack.chain())?;
        let _session = self.session(Operation::Purge, Kind::Stack, &chain)?;
        self.purge_stack_inner(&chain, force, cascade)
    }

    /// Purge a cell. With `cascade`, each listed container is purged on its
    /// own first; otherwise containers go with the cell's delete step.
    pub fn purge_cell(&self, cell: &Cell, cascade: bool) -> ControllerResult<PurgeCellResult> {
        let chain = validate::resolve(Kind::Cell, &cell.chain())?;
        let _session = self.session(Operation::Purge, Kind::Cell, &chain)?;
        self.purge_cell_inner(&chain, cascade)
    }

    pub fn purge_container(&self, container: &Container) -> ControllerResult<PurgeContainerResult> {
        let chain = validate::resolve(Kind::Container, &container.chain())?;
        let _session = self.session(Operation::Purge, Kind::Container, &chain)?;
        self.purge_container_inner(&chain)
    }

    // ── Per-kind purge on trimmed chains ───────────────────────────

    fn purge_realm_inner(
        &self,
        chain: &NameChain,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<PurgeRealmResult> {
        let pre = self.inspect_realm(chain)?;
        let mut purged = Vec::new();
        for space in self.gate(chain, force, cascade)? {
            self.purge_space_inner(&chain.child(space.as_str()), force, cascade)?;
            purged.push(child_marker(Kind::Space, &space));
        }
        if pre.metadata_exists {
            let outcome = self.delete_realm_inner(chain, true, false).map(|r| r.deleted);
            record_delete(outcome, chain, &mut purged);
        }
        let purge_succeeded = record_deep_clean(
            self.runner().purge_realm(&pre.realm),
            Kind::Realm,
            chain,
            &SCOPE_PURGE_TAGS,
            &mut purged,
        );
        Ok(PurgeResult {
            pre,
            purged,
            purge_succeeded,
        })
    }

    fn purge_space_inner(
        &self,
        chain: &NameChain,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<PurgeSpaceResult> {
        let pre = self.inspect_space(chain)?;
        let mut purged = Vec::new();
        for stack in self.gate(chain, force, cascade)? {
            self.purge_stack_inner(&chain.child(stack.as_str()), force, cascade)?;
            purged.push(child_marker(Kind::Stack, &stack));
        }
        if pre.metadata_exists {
            let outcome = self.delete_space_inner(chain, true, false).map(|r| r.deleted);
            record_delete(outcome, chain, &mut purged);
        }
        let purge_succeeded = record_deep_clean(
            self.runner().purge_space(&pre.space),
            Kind::Space,
            chain,
            &SCOPE_PURGE_TAGS,
            &mut purged,
        );
        Ok(PurgeResult {
            pre,
            purged,
            purge_succeeded,
        })
    }

    fn purge_stack_inner(
        &self,
        chain: &NameChain,
        force: bool,
        cascade: bool,
    ) -> ControllerResult<PurgeStackResult> {
        let pre = self.inspect_stack(chain)?;
        let mut purged = Vec::new();
        for cell in self.gate(chain, force, cascade)? {
            self.purge_cell_inner(&chain.child(cell.as_str()), cascade)?;
            purged.push(child_marker(Kind::Cell, &cell));
        }
        if pre.metadata_exists {
            let outcome = self.delete_stack_inner(chain, true, false).map(|r| r.deleted);
            record_delete(outcome, chain, &mut purged);
        }
        let purge_succeeded = record_deep_clean(
            self.runner().purge_stack(&pre.stack),
            Kind::Stack,
            chain,
            &SCOPE_PURGE_TAGS,
            &mut purged,
        );
        Ok(PurgeResult {
            pre,
            purged,
            purge_succeeded,
        })
    }

    fn purge_cell_inner(&self, chain: &NameChain, cascade: bool) -> ControllerResult<PurgeCellResult> {
        let pre = self.inspect_cell(chain)?;
        let mut purged = Vec::new();
        if cascade {
            // Containers are never gated, so force plays no part here.
            for id in self.gate(chain, false, true)? {
                self.purge_container_inner(&chain.child(id.as_str()))?;
                purged.push(child_marker(Kind::Container, &id));
            }
        }
        if pre.metadata_exists {
            let outcome = self.delete_cell_inner(chain).map(|r| r.deleted);
            record_delete(outcome, chain, &mut purged);
        }
        let purge_succeeded = record_deep_clean(
            self.runner().purge_cell(&pre.cell),
            Kind::Cell,
            chain,
            &SCOPE_PURGE_TAGS,
            &mut purged,
        );
        Ok(PurgeResult {
            pre,
            purged,
            purge_succeeded,
        })
    }

    fn purge_container_inner(&self, chain: &NameChain) -> ControllerResult<PurgeContainerResult> {
        let pre = self.inspect_container(chain)?;
        let mut purged = Vec::new();
        if pre.container_exists {
            let outcome = self.delete_container_inner(chain).map(|r| r.deleted);
            record_delete(outcome, chain, &mut purged);
        }
        let purge_succeeded = record_deep_clean(
            self.runner().purge_container(&pre.container),
            Kind::Container,
            chain,
            &CONTAINER_PURGE_TAGS,
            &mut purged,
        );
        Ok(PurgeResult {
            pre,
            purged,
            purge_succeeded,
        })
    }
}
