//! The `Runner` capability trait.

use cell_core::{Cell, Container, ContainerSpec, NameChain, Realm, Space, Stack};

use crate::error::RunnerResult;

/// Execution backend interface, injected into the controller so tests can
/// substitute a scripted backend.
///
/// One method family per resource kind plus infra predicates and lifecycle
/// actions. Implementations must:
///
/// 1. Return [`RunnerError::NotFound`](crate::RunnerError::NotFound) when the
///    addressed resource is absent.
/// 2. Make `ensure_*` and `purge_*` safe to call redundantly.
/// 3. Return the fully-populated resource from `create_*`/`ensure_*`.
///
/// `create_*` provisions metadata and every infra piece. `ensure_*` keeps
/// the stored metadata and creates only the infra pieces that are missing.
/// `purge_*` must succeed even when the resource's metadata never existed:
/// it sweeps whatever host state is still attributed to the name chain.
///
/// Partial failures inside a call are the implementation's to roll back;
/// the controller does not compensate.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The controller assumes at most
/// one in-flight mutating call per resource chain; serializing concurrent
/// callers is up to the implementation.
pub trait Runner: Send + Sync {
    /// Acquire the backend connection for one controller call.
    fn open(&self) -> RunnerResult<()>;

    /// Release the connection acquired by [`Runner::open`].
    fn close(&self);

    // ── Infra predicates ───────────────────────────────────────────

    /// Whether the cgroup scope of `scope` exists.
    fn exists_cgroup(&self, scope: &NameChain) -> RunnerResult<bool>;

    /// Whether the container-runtime namespace exists.
    fn exists_namespace(&self, namespace: &str) -> RunnerResult<bool>;

    /// Whether the space's CNI network config exists.
    fn exists_cni_config(&self, space: &Space) -> RunnerResult<bool>;

    /// Whether the cell's root container exists.
    fn exists_root_container(&self, cell: &Cell) -> RunnerResult<bool>;

    // ── Realm ──────────────────────────────────────────────────────

    fn get_realm(&self, realm: &Realm) -> RunnerResult<Realm>;
    fn list_realms(&self) -> RunnerResult<Vec<Realm>>;
    fn create_realm(&self, realm: &Realm) -> RunnerResult<Realm>;
    fn ensure_realm(&self, realm: &Realm) -> RunnerResult<Realm>;
    fn delete_realm(&self, realm: &Realm) -> RunnerResult<()>;
    fn purge_realm(&self, realm: &Realm) -> RunnerResult<()>;

    // ── Space ──────────────────────────────────────────────────────

    fn get_space(&self, space: &Space) -> RunnerResult<Space>;
    fn list_spaces(&self, realm: &str) -> RunnerResult<Vec<Space>>;
    fn create_space(&self, space: &Space) -> RunnerResult<Space>;
    fn ensure_space(&self, space: &Space) -> RunnerResult<Space>;
    fn delete_space(&self, space: &Space) -> RunnerResult<()>;
    fn purge_space(&self, space: &Space) -> RunnerResult<()>;

    // ── Stack ──────────────────────────────────────────────────────

    fn get_stack(&self, stack: &Stack) -> RunnerResult<Stack>;
    fn list_stacks(&self, realm: &str, space: &str) -> RunnerResult<Vec<Stack>>;
    fn create_stack(&self, stack: &Stack) -> RunnerResult<Stack>;
    fn ensure_stack(&self, stack: &Stack) -> RunnerResult<Stack>;
    fn delete_stack(&self, stack: &Stack) -> RunnerResult<()>;
    fn purge_stack(&self, stack: &Stack) -> RunnerResult<()>;

    // ── Cell ───────────────────────────────────────────────────────

    fn get_cell(&self, cell: &Cell) -> RunnerResult<Cell>;
    fn list_cells(&self, realm: &str, space: &str, stack: &str) -> RunnerResult<Vec<Cell>>;
    fn create_cell(&self, cell: &Cell) -> RunnerResult<Cell>;
    fn ensure_cell(&self, cell: &Cell) -> RunnerResult<Cell>;
    fn delete_cell(&self, cell: &Cell) -> RunnerResult<()>;
    fn purge_cell(&self, cell: &Cell) -> RunnerResult<()>;

    /// Start every container listed in the cell.
    fn start_cell(&self, cell: &Cell) -> RunnerResult<Cell>;

    /// Stop every container listed in the cell.
    fn kill_cell(&self, cell: &Cell) -> RunnerResult<Cell>;

    /// Persist the cell's labels and status over the stored metadata.
    fn update_cell_metadata(&self, cell: &Cell) -> RunnerResult<Cell>;

    // ── Container ──────────────────────────────────────────────────

    fn get_container(&self, container: &Container) -> RunnerResult<Container>;
    fn list_containers(
        &self,
        realm: &str,
        space: &str,
        stack: &str,
        cell: &str,
    ) -> RunnerResult<Vec<ContainerSpec>>;
    fn create_container(&self, container: &Container) -> RunnerResult<Container>;
    fn ensure_container(&self, container: &Container) -> RunnerResult<Container>;
    fn delete_container(&self, container: &Container) -> RunnerResult<()>;
    fn purge_container(&self, container: &Container) -> RunnerResult<()>;
    fn start_container(&self, container: &Container) -> RunnerResult<Container>;
    fn kill_container(&self, container: &Container) -> RunnerResult<Container>;
}
