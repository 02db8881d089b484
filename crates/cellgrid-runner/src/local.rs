//! LocalRunner: reference backend over the CellGrid state store.
//!
//! Metadata goes to the realm/space/stack/cell tables. Every host-level
//! resource a real backend would provision (cgroup scope, runtime
//! namespace, CNI config list, runtime task) is tracked as an
//! [`InfraRecord`] keyed by its host identity and attributed to the owning
//! resource's name chain, so existence predicates and purge sweeps behave
//! the way they would against the host.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use cell_core::config::RunnerConfig;
use cell_core::{
    Cell, CellState, Container, ContainerSpec, ContainerState, Kind, NameChain, Realm,
    RealmState, Space, SpaceState, Stack, StackState,
};
use cellgrid_state::{InfraKind, InfraRecord, InfraState, StateStore};

use crate::error::{RunnerError, RunnerResult};
use crate::runner::Runner;

/// Runner that records resources in a [`StateStore`] instead of touching
/// the host.
pub struct LocalRunner {
    store: StateStore,
    cgroup_root: String,
    cni_conf_dir: String,
    sessions: AtomicUsize,
}

impl LocalRunner {
    pub fn new(store: StateStore, config: &RunnerConfig) -> Self {
        Self {
            store,
            cgroup_root: config.cgroup_root.clone(),
            cni_conf_dir: config.cni_conf_dir.clone(),
            sessions: AtomicUsize::new(0),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Number of sessions currently open.
    pub fn active_sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    /// Cgroup path of the scope identified by `chain`.
    pub fn cgroup_path(&self, chain: &NameChain) -> String {
        chain.cgroup_path(&self.cgroup_root)
    }

    /// CNI config list path of a space, falling back to the conf dir.
    pub fn cni_config_path(&self, space: &Space) -> String {
        let declared = space.spec.cni_config_path.trim();
        if declared.is_empty() {
            format!(
                "{}/{}.conflist",
                self.cni_conf_dir.trim_end_matches('/'),
                space.chain().network_name()
            )
        } else {
            declared.to_string()
        }
    }

    // ── Infra helpers ──────────────────────────────────────────────

    /// Create the infra record if it is missing. Returns true if created.
    fn provision(&self, kind: InfraKind, identity: &str, owner: &str) -> RunnerResult<bool> {
        if self.store.infra_exists(kind, identity)? {
            return Ok(false);
        }
        self.store
            .put_infra(&InfraRecord::new(kind, identity, owner, epoch_secs()))?;
        debug!(kind = kind.prefix(), %identity, %owner, "infra provisioned");
        Ok(true)
    }

    fn release(&self, kind: InfraKind, identity: &str) -> RunnerResult<()> {
        if !self.store.delete_infra(kind, identity)? {
            debug!(kind = kind.prefix(), %identity, "infra already absent");
        }
        Ok(())
    }

    /// Set a task's state, provisioning the task first if needed.
    fn set_task_state(&self, identity: &str, owner: &str, state: InfraState) -> RunnerResult<()> {
        let mut record = match self.store.get_infra(InfraKind::Task, identity)? {
            Some(record) => record,
            None => InfraRecord::new(InfraKind::Task, identity, owner, epoch_secs()),
        };
        record.state = state;
        record.updated_at = epoch_secs();
        self.store.put_infra(&record)?;
        Ok(())
    }

    /// Remove every infra record attributed to `chain` or beneath it, plus
    /// all metadata in the subtree.
    fn sweep(&self, chain: &NameChain) -> RunnerResult<()> {
        let owner = chain.key();
        let records = self.store.list_infra_owned_by(&owner)?;
        let swept = records.len();
        for record in records {
            self.store.delete_infra(record.kind, &record.identity)?;
        }
        let removed = self.store.delete_subtree(chain)?;
        info!(%chain, swept, removed, "purge sweep complete");
        Ok(())
    }

    // ── Cell helpers ───────────────────────────────────────────────

    fn stored_cell(&self, chain: &NameChain) -> RunnerResult<Cell> {
        self.store
            .get_cell(&chain.realm, &chain.space, &chain.stack, &chain.cell)?
            .ok_or_else(|| RunnerError::not_found(Kind::Cell, &chain_to_cell(chain)))
    }

    /// Task ids of every container a cell runs: the root first, then each
    /// listed container with a non-blank id.
    fn cell_tasks(cell: &Cell) -> Vec<(String, String)> {
        let chain = cell.chain();
        let root = cell.root_container_id().to_string();
        let mut tasks = vec![(chain.task_id(&root), container_owner(&chain, &root))];
        for spec in &cell.spec.containers {
            let id = spec.id.trim();
            if id.is_empty() || id == root {
                continue;
            }
            tasks.push((chain.task_id(id), container_owner(&chain, id)));
        }
        tasks
    }

    fn provision_cell(&self, cell: &Cell) -> RunnerResult<()> {
        let chain = cell.chain();
        self.provision(InfraKind::Cgroup, &self.cgroup_path(&chain), &chain.key())?;
        for (task, owner) in Self::cell_tasks(cell) {
            self.provision(InfraKind::Task, &task, &owner)?;
        }
        Ok(())
    }

    fn set_cell_tasks(&self, cell: &Cell, state: InfraState) -> RunnerResult<Cell> {
        let stored = self.stored_cell(&cell.chain())?;
        for (task, owner) in Self::cell_tasks(&stored) {
            self.set_task_state(&task, &owner, state)?;
        }
        Ok(stored)
    }

    // ── Container helpers ──────────────────────────────────────────

    /// The cell holding `container` and the position of its spec, if listed.
    fn locate(&self, container: &Container) -> RunnerResult<(Cell, Option<usize>)> {
        let cell = self.stored_cell(&container.chain())?;
        let id = container.id();
        let position = cell.spec.containers.iter().position(|c| c.id == id);
        Ok((cell, position))
    }

    fn listed(&self, container: &Container) -> RunnerResult<(Cell, usize)> {
        match self.locate(container)? {
            (cell, Some(position)) => Ok((cell, position)),
            (_, None) => Err(RunnerError::not_found(Kind::Container, &container.chain())),
        }
    }

    fn container_view(&self, cell: &Cell, spec: &ContainerSpec) -> RunnerResult<Container> {
        let task = cell.chain().task_id(&spec.id);
        let state = match self.store.get_infra(InfraKind::Task, &task)? {
            Some(record) => match record.state {
                InfraState::Created => ContainerState::Pending,
                InfraState::Running => ContainerState::Ready,
                InfraState::Stopped => ContainerState::Stopped,
            },
            None => ContainerState::Unknown,
        };
        let mut container = Container::from_spec(spec);
        container.status.state = state;
        Ok(container)
    }

    fn container_task(container: &Container) -> (String, String) {
        let chain = container.chain();
        let id = container.id();
        (chain.task_id(id), container_owner(&chain, id))
    }
}

impl Runner for LocalRunner {
    fn open(&self) -> RunnerResult<()> {
        let open = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(open, "runner session opened");
        Ok(())
    }

    fn close(&self) {
        let previous = self
            .sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if previous.is_err() {
            warn!("runner session closed without a matching open");
        }
    }

    // ── Infra predicates ───────────────────────────────────────────

    fn exists_cgroup(&self, scope: &NameChain) -> RunnerResult<bool> {
        Ok(self
            .store
            .infra_exists(InfraKind::Cgroup, &self.cgroup_path(scope))?)
    }

    fn exists_namespace(&self, namespace: &str) -> RunnerResult<bool> {
        Ok(self.store.infra_exists(InfraKind::Namespace, namespace)?)
    }

    fn exists_cni_config(&self, space: &Space) -> RunnerResult<bool> {
        Ok(self
            .store
            .infra_exists(InfraKind::CniConfig, &self.cni_config_path(space))?)
    }

    fn exists_root_container(&self, cell: &Cell) -> RunnerResult<bool> {
        let task = cell.chain().task_id(cell.root_container_id());
        Ok(self.store.infra_exists(InfraKind::Task, &task)?)
    }

    // ── Realm ──────────────────────────────────────────────────────

    fn get_realm(&self, realm: &Realm) -> RunnerResult<Realm> {
        self.store
            .get_realm(&realm.metadata.name)?
            .ok_or_else(|| RunnerError::not_found(Kind::Realm, &realm.chain()))
    }

    fn list_realms(&self) -> RunnerResult<Vec<Realm>> {
        Ok(self.store.list_realms()?)
    }

    fn create_realm(&self, realm: &Realm) -> RunnerResult<Realm> {
        let mut realm = realm.clone();
        realm.status.state = RealmState::Ready;
        self.store.put_realm(&realm)?;
        self.ensure_realm(&realm)
    }

    fn ensure_realm(&self, realm: &Realm) -> RunnerResult<Realm> {
        let stored = self.get_realm(realm)?;
        let chain = stored.chain();
        let owner = chain.key();
        self.provision(InfraKind::Cgroup, &self.cgroup_path(&chain), &owner)?;
        self.provision(InfraKind::Namespace, stored.effective_namespace(), &owner)?;
        Ok(stored)
    }

    fn delete_realm(&self, realm: &Realm) -> RunnerResult<()> {
        let stored = self.get_realm(realm)?;
        let chain = stored.chain();
        self.release(InfraKind::Namespace, stored.effective_namespace())?;
        self.release(InfraKind::Cgroup, &self.cgroup_path(&chain))?;
        self.store.delete_realm(&stored.metadata.name)?;
        info!(realm = %stored.metadata.name, "realm deleted");
        Ok(())
    }

    fn purge_realm(&self, realm: &Realm) -> RunnerResult<()> {
        self.sweep(&realm.chain())
    }

    // ── Space ──────────────────────────────────────────────────────

    fn get_space(&self, space: &Space) -> RunnerResult<Space> {
        self.store
            .get_space(&space.spec.realm_name, &space.metadata.name)?
            .ok_or_else(|| RunnerError::not_found(Kind::Space, &space.chain()))
    }

    fn list_spaces(&self, realm: &str) -> RunnerResult<Vec<Space>> {
        if self.store.get_realm(realm)?.is_none() {
            return Err(RunnerError::not_found(Kind::Realm, &NameChain::realm(realm)));
        }
        Ok(self.store.list_spaces(realm)?)
    }

    fn create_space(&self, space: &Space) -> RunnerResult<Space> {
        let mut space = space.clone();
        space.status.state = SpaceState::Ready;
        self.store.put_space(&space)?;
        self.ensure_space(&space)
    }

    fn ensure_space(&self, space: &Space) -> RunnerResult<Space> {
        let stored = self.get_space(space)?;
        let chain = stored.chain();
        let owner = chain.key();
        self.provision(InfraKind::Cgroup, &self.cgroup_path(&chain), &owner)?;
        self.provision(InfraKind::CniConfig, &self.cni_config_path(&stored), &owner)?;
        Ok(stored)
    }

    fn delete_space(&self, space: &Space) -> RunnerResult<()> {
        let stored = self.get_space(space)?;
        let chain = stored.chain();
        self.release(InfraKind::CniConfig, &self.cni_config_path(&stored))?;
        self.release(InfraKind::Cgroup, &self.cgroup_path(&chain))?;
        self.store.delete_space(&chain.realm, &chain.space)?;
        info!(%chain, "space deleted");
        Ok(())
    }

    fn purge_space(&self, space: &Space) -> RunnerResult<()> {
        self.sweep(&space.chain())
    }

    // ── Stack ──────────────────────────────────────────────────────

    fn get_stack(&self, stack: &Stack) -> RunnerResult<Stack> {
        let chain = stack.chain();
        self.store
            .get_stack(&chain.realm, &chain.space, &chain.stack)?
            .ok_or_else(|| RunnerError::not_found(Kind::Stack, &chain))
    }

    fn list_stacks(&self, realm: &str, space: &str) -> RunnerResult<Vec<Stack>> {
        if self.store.get_space(realm, space)?.is_none() {
            return Err(RunnerError::not_found(
                Kind::Space,
                &NameChain::space(realm, space),
            ));
        }
        Ok(self.store.list_stacks(realm, space)?)
    }

    fn create_stack(&self, stack: &Stack) -> RunnerResult<Stack> {
        let mut stack = stack.clone();
        stack.status.state = StackState::Ready;
        self.store.put_stack(&stack)?;
        self.ensure_stack(&stack)
    }

    fn ensure_stack(&self, stack: &Stack) -> RunnerResult<Stack> {
        let stored = self.get_stack(stack)?;
        let chain = stored.chain();
        self.provision(InfraKind::Cgroup, &self.cgroup_path(&chain), &chain.key())?;
        Ok(stored)
    }

    fn delete_stack(&self, stack: &Stack) -> RunnerResult<()> {
        let stored = self.get_stack(stack)?;
        let chain = stored.chain();
        self.release(InfraKind::Cgroup, &self.cgroup_path(&chain))?;
        self.store
            .delete_stack(&chain.realm, &chain.space, &chain.stack)?;
        info!(%chain, "stack deleted");
        Ok(())
    }

    fn purge_stack(&self, stack: &Stack) -> RunnerResult<()> {
        self.sweep(&stack.chain())
    }

    // ── Cell ───────────────────────────────────────────────────────

    fn get_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        self.stored_cell(&cell.chain())
    }

    fn list_cells(&self, realm: &str, space: &str, stack: &str) -> RunnerResult<Vec<Cell>> {
        if self.store.get_stack(realm, space, stack)?.is_none() {
            return Err(RunnerError::not_found(
                Kind::Stack,
                &NameChain::stack(realm, space, stack),
            ));
        }
        Ok(self.store.list_cells(realm, space, stack)?)
    }

    fn create_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        let mut cell = cell.clone();
        cell.status.state = CellState::Pending;
        self.store.put_cell(&cell)?;
        self.provision_cell(&cell)?;
        Ok(cell)
    }

    fn ensure_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        let mut stored = self.stored_cell(&cell.chain())?;
        // Requested containers are upserted by id; unlisted ones are kept.
        for spec in &cell.spec.containers {
            match stored.spec.containers.iter_mut().find(|c| c.id == spec.id) {
                Some(existing) => *existing = spec.clone(),
                None => stored.spec.containers.push(spec.clone()),
            }
        }
        if !cell.spec.root_container_id.trim().is_empty() {
            stored.spec.root_container_id = cell.spec.root_container_id.clone();
        }
        for (key, value) in &cell.metadata.labels {
            stored
                .metadata
                .labels
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self.store.put_cell(&stored)?;
        self.provision_cell(&stored)?;
        Ok(stored)
    }

    fn delete_cell(&self, cell: &Cell) -> RunnerResult<()> {
        let stored = self.stored_cell(&cell.chain())?;
        let chain = stored.chain();
        for (task, _) in Self::cell_tasks(&stored) {
            self.release(InfraKind::Task, &task)?;
        }
        self.release(InfraKind::Cgroup, &self.cgroup_path(&chain))?;
        self.store
            .delete_cell(&chain.realm, &chain.space, &chain.stack, &chain.cell)?;
        info!(%chain, "cell deleted");
        Ok(())
    }

    fn purge_cell(&self, cell: &Cell) -> RunnerResult<()> {
        self.sweep(&cell.chain())
    }

    fn start_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        let stored = self.set_cell_tasks(cell, InfraState::Running)?;
        info!(chain = %stored.chain(), "cell started");
        Ok(stored)
    }

    fn kill_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        let stored = self.set_cell_tasks(cell, InfraState::Stopped)?;
        info!(chain = %stored.chain(), "cell killed");
        Ok(stored)
    }

    fn update_cell_metadata(&self, cell: &Cell) -> RunnerResult<Cell> {
        let mut stored = self.stored_cell(&cell.chain())?;
        stored.metadata.labels = cell.metadata.labels.clone();
        stored.status = cell.status.clone();
        self.store.put_cell(&stored)?;
        debug!(chain = %stored.chain(), state = ?stored.status.state, "cell metadata updated");
        Ok(stored)
    }

    // ── Container ──────────────────────────────────────────────────

    fn get_container(&self, container: &Container) -> RunnerResult<Container> {
        let (cell, position) = self.listed(container)?;
        self.container_view(&cell, &cell.spec.containers[position])
    }

    fn list_containers(
        &self,
        realm: &str,
        space: &str,
        stack: &str,
        cell: &str,
    ) -> RunnerResult<Vec<ContainerSpec>> {
        let cell = self.stored_cell(&NameChain::cell(realm, space, stack, cell))?;
        Ok(cell.spec.containers)
    }

    fn create_container(&self, container: &Container) -> RunnerResult<Container> {
        let (mut cell, position) = self.locate(container)?;
        let mut spec = container.spec.clone();
        spec.id = container.id().to_string();
        match position {
            Some(i) => cell.spec.containers[i] = spec,
            None => cell.spec.containers.push(spec),
        }
        self.store.put_cell(&cell)?;
        self.ensure_container(container)
    }

    fn ensure_container(&self, container: &Container) -> RunnerResult<Container> {
        let (cell, position) = self.listed(container)?;
        let (task, owner) = Self::container_task(container);
        self.provision(InfraKind::Task, &task, &owner)?;
        self.container_view(&cell, &cell.spec.containers[position])
    }

    fn delete_container(&self, container: &Container) -> RunnerResult<()> {
        let (mut cell, position) = self.listed(container)?;
        let (task, _) = Self::container_task(container);
        self.release(InfraKind::Task, &task)?;
        cell.spec.containers.remove(position);
        self.store.put_cell(&cell)?;
        info!(chain = %container.chain(), "container deleted");
        Ok(())
    }

    fn purge_container(&self, container: &Container) -> RunnerResult<()> {
        let chain = container.chain();
        // The cell may be gone already; only the task and its records matter.
        match self.locate(container) {
            Ok((mut cell, Some(position))) => {
                cell.spec.containers.remove(position);
                self.store.put_cell(&cell)?;
            }
            Ok((_, None)) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        let (task, owner) = Self::container_task(container);
        self.release(InfraKind::Task, &task)?;
        for record in self.store.list_infra_owned_by(&owner)? {
            self.store.delete_infra(record.kind, &record.identity)?;
        }
        info!(%chain, "container purged");
        Ok(())
    }

    fn start_container(&self, container: &Container) -> RunnerResult<Container> {
        let (cell, position) = self.listed(container)?;
        let (task, owner) = Self::container_task(container);
        self.set_task_state(&task, &owner, InfraState::Running)?;
        self.container_view(&cell, &cell.spec.containers[position])
    }

    fn kill_container(&self, container: &Container) -> RunnerResult<Container> {
        let (cell, position) = self.listed(container)?;
        let (task, owner) = Self::container_task(container);
        self.set_task_state(&task, &owner, InfraState::Stopped)?;
        self.container_view(&cell, &cell.spec.containers[position])
    }
}

/// Owner key of a container's task: the cell key plus the container id.
fn container_owner(cell: &NameChain, id: &str) -> String {
    format!("{}/{}", cell.key(), id)
}

/// Drop the container level from a chain.
fn chain_to_cell(chain: &NameChain) -> NameChain {
    NameChain::cell(&chain.realm, &chain.space, &chain.stack, &chain.cell)
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_runner() -> LocalRunner {
        let store = StateStore::open_in_memory().unwrap();
        LocalRunner::new(store, &RunnerConfig::default())
    }

    fn seeded_cell(runner: &LocalRunner) -> Cell {
        runner.create_realm(&Realm::new("r")).unwrap();
        runner.create_space(&Space::new("r", "s")).unwrap();
        runner.create_stack(&Stack::new("r", "s", "st")).unwrap();
        let mut cell = Cell::new("r", "s", "st", "c");
        cell.spec.containers.push(ContainerSpec {
            id: "web".to_string(),
            realm_name: "r".to_string(),
            space_name: "s".to_string(),
            stack_name: "st".to_string(),
            cell_name: "c".to_string(),
            image: "nginx:1.27".to_string(),
            ..Default::default()
        });
        runner.create_cell(&cell).unwrap()
    }

    #[test]
    fn create_realm_provisions_infra() {
        let runner = test_runner();
        let realm = runner.create_realm(&Realm::new("r1")).unwrap();

        assert_eq!(realm.status.state, RealmState::Ready);
        assert!(runner.exists_cgroup(&NameChain::realm("r1")).unwrap());
        assert!(runner.exists_namespace("r1").unwrap());
    }

    #[test]
    fn ensure_restores_missing_infra_only() {
        let runner = test_runner();
        let space = runner.create_space(&Space::new("r", "s")).unwrap();
        let cgroup = runner.cgroup_path(&space.chain());
        runner.store().delete_infra(InfraKind::Cgroup, &cgroup).unwrap();
        assert!(!runner.exists_cgroup(&space.chain()).unwrap());

        runner.ensure_space(&space).unwrap();
        assert!(runner.exists_cgroup(&space.chain()).unwrap());
        assert!(runner.exists_cni_config(&space).unwrap());
    }

    #[test]
    fn ensure_requires_metadata() {
        let runner = test_runner();
        let err = runner.ensure_stack(&Stack::new("r", "s", "st")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn default_cni_path_uses_network_name() {
        let runner = test_runner();
        let space = Space::new("r1", "s1");
        assert_eq!(runner.cni_config_path(&space), "/etc/cni/net.d/r1_s1.conflist");
    }

    #[test]
    fn delete_missing_space_is_not_found() {
        let runner = test_runner();
        let err = runner.delete_space(&Space::new("r", "s")).unwrap_err();
        assert!(matches!(err, RunnerError::NotFound { kind: Kind::Space, .. }));
    }

    #[test]
    fn cell_create_provisions_root_and_container_tasks() {
        let runner = test_runner();
        let cell = seeded_cell(&runner);

        assert_eq!(cell.status.state, CellState::Pending);
        assert!(runner.exists_root_container(&cell).unwrap());
        let web = runner
            .get_container(&Container::new("r", "s", "st", "c", "web"))
            .unwrap();
        assert_eq!(web.status.state, ContainerState::Pending);
    }

    #[test]
    fn start_and_kill_cell_move_task_state() {
        let runner = test_runner();
        let cell = seeded_cell(&runner);
        let web = Container::new("r", "s", "st", "c", "web");

        runner.start_cell(&cell).unwrap();
        assert_eq!(
            runner.get_container(&web).unwrap().status.state,
            ContainerState::Ready
        );

        runner.kill_cell(&cell).unwrap();
        assert_eq!(
            runner.get_container(&web).unwrap().status.state,
            ContainerState::Stopped
        );
    }

    #[test]
    fn ensure_cell_upserts_containers() {
        let runner = test_runner();
        let mut cell = seeded_cell(&runner);
        runner
            .create_container(&Container::new("r", "s", "st", "c", "sidecar"))
            .unwrap();

        cell.spec.containers[0].image = "nginx:1.28".to_string();
        let ensured = runner.ensure_cell(&cell).unwrap();
        let ids: Vec<&str> = ensured.spec.containers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["web", "sidecar"]);
        assert_eq!(ensured.spec.containers[0].image, "nginx:1.28");
    }

    #[test]
    fn delete_container_removes_spec_and_task() {
        let runner = test_runner();
        seeded_cell(&runner);
        let web = Container::new("r", "s", "st", "c", "web");

        runner.delete_container(&web).unwrap();
        assert!(runner.get_container(&web).unwrap_err().is_not_found());
        assert!(runner.list_containers("r", "s", "st", "c").unwrap().is_empty());
        assert!(!runner
            .store()
            .infra_exists(InfraKind::Task, "r_s_st_c_web")
            .unwrap());
    }

    #[test]
    fn purge_container_without_metadata_succeeds() {
        let runner = test_runner();
        seeded_cell(&runner);
        let ghost = Container::new("r", "s", "st", "c", "ghost");
        runner
            .store()
            .put_infra(&InfraRecord::new(InfraKind::Task, "r_s_st_c_ghost", "r/s/st/c/ghost", 1))
            .unwrap();

        runner.purge_container(&ghost).unwrap();
        runner.purge_container(&ghost).unwrap();
        assert!(!runner
            .store()
            .infra_exists(InfraKind::Task, "r_s_st_c_ghost")
            .unwrap());
    }

    #[test]
    fn purge_realm_sweeps_everything_beneath() {
        let runner = test_runner();
        seeded_cell(&runner);

        runner.purge_realm(&Realm::new("r")).unwrap();
        assert!(runner.store().list_infra_owned_by("r").unwrap().is_empty());
        assert!(runner.list_realms().unwrap().is_empty());
        assert!(runner.store().get_cell("r", "s", "st", "c").unwrap().is_none());
    }

    #[test]
    fn listing_children_of_missing_parent_is_not_found() {
        let runner = test_runner();
        assert!(runner.list_spaces("nope").unwrap_err().is_not_found());
        assert!(runner.list_cells("r", "s", "st").unwrap_err().is_not_found());
    }

    #[test]
    fn sessions_are_counted() {
        let runner = test_runner();
        runner.open().unwrap();
        runner.open().unwrap();
        assert_eq!(runner.active_sessions(), 2);
        runner.close();
        runner.close();
        runner.close();
        assert_eq!(runner.active_sessions(), 0);
    }
}
