//! Shared test double: a `LocalRunner` over an in-memory store, wrapped
//! with a call log, session counters and per-method failure injection.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use cell_core::config::RunnerConfig;
use cell_core::*;
use cellgrid_controller::Controller;
use cellgrid_runner::{LocalRunner, Runner, RunnerError, RunnerResult};
use cellgrid_state::StateStore;

pub struct ScriptedRunner {
    inner: LocalRunner,
    failures: Mutex<HashMap<&'static str, String>>,
    vanished: Mutex<HashMap<&'static str, Kind>>,
    calls: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        let store = StateStore::open_in_memory().unwrap();
        Self {
            inner: LocalRunner::new(store, &RunnerConfig::default()),
            failures: Mutex::new(HashMap::new()),
            vanished: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        }
    }

    pub fn local(&self) -> &LocalRunner {
        &self.inner
    }

    pub fn store(&self) -> &StateStore {
        self.inner.store()
    }

    /// Make every later call to `method` fail with a backend error.
    pub fn fail(&self, method: &'static str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(method, message.to_string());
    }

    /// Make every later call to `method` report its `kind` target as gone,
    /// as if something else removed it first.
    pub fn vanish(&self, method: &'static str, kind: Kind) {
        self.vanished.lock().unwrap().insert(method, kind);
    }

    pub fn heal(&self, method: &'static str) {
        self.failures.lock().unwrap().remove(method);
        self.vanished.lock().unwrap().remove(method);
    }

    /// Calls made so far, as `"<method> <key>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls to `method`, by key, in order.
    pub fn calls_to(&self, method: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| {
                let (m, key) = c.split_once(' ')?;
                (m == method).then(|| key.to_string())
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn step(&self, method: &'static str, key: String) -> RunnerResult<()> {
        self.calls.lock().unwrap().push(format!("{method} {key}"));
        if let Some(kind) = self.vanished.lock().unwrap().get(method) {
            return Err(RunnerError::NotFound { kind: *kind, key });
        }
        match self.failures.lock().unwrap().get(method) {
            Some(message) => Err(RunnerError::Backend(message.clone())),
            None => Ok(()),
        }
    }
}

impl Runner for ScriptedRunner {
    fn open(&self) -> RunnerResult<()> {
        self.step("open", String::new())?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open()
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }

    fn exists_cgroup(&self, scope: &NameChain) -> RunnerResult<bool> {
        self.step("exists_cgroup", scope.key())?;
        self.inner.exists_cgroup(scope)
    }

    fn exists_namespace(&self, namespace: &str) -> RunnerResult<bool> {
        self.step("exists_namespace", namespace.to_string())?;
        self.inner.exists_namespace(namespace)
    }

    fn exists_cni_config(&self, space: &Space) -> RunnerResult<bool> {
        self.step("exists_cni_config", space.chain().key())?;
        self.inner.exists_cni_config(space)
    }

    fn exists_root_container(&self, cell: &Cell) -> RunnerResult<bool> {
        self.step("exists_root_container", cell.chain().key())?;
        self.inner.exists_root_container(cell)
    }

    fn get_realm(&self, realm: &Realm) -> RunnerResult<Realm> {
        self.step("get_realm", realm.chain().key())?;
        self.inner.get_realm(realm)
    }

    fn list_realms(&self) -> RunnerResult<Vec<Realm>> {
        self.step("list_realms", String::new())?;
        self.inner.list_realms()
    }

    fn create_realm(&self, realm: &Realm) -> RunnerResult<Realm> {
        self.step("create_realm", realm.chain().key())?;
        self.inner.create_realm(realm)
    }

    fn ensure_realm(&self, realm: &Realm) -> RunnerResult<Realm> {
        self.step("ensure_realm", realm.chain().key())?;
        self.inner.ensure_realm(realm)
    }

    fn delete_realm(&self, realm: &Realm) -> RunnerResult<()> {
        self.step("delete_realm", realm.chain().key())?;
        self.inner.delete_realm(realm)
    }

    fn purge_realm(&self, realm: &Realm) -> RunnerResult<()> {
        self.step("purge_realm", realm.chain().key())?;
        self.inner.purge_realm(realm)
    }

    fn get_space(&self, space: &Space) -> RunnerResult<Space> {
        self.step("get_space", space.chain().key())?;
        self.inner.get_space(space)
    }

    fn list_spaces(&self, realm: &str) -> RunnerResult<Vec<Space>> {
        self.step("list_spaces", realm.to_string())?;
        self.inner.list_spaces(realm)
    }

    fn create_space(&self, space: &Space) -> RunnerResult<Space> {
        self.step("create_space", space.chain().key())?;
        self.inner.create_space(space)
    }

    fn ensure_space(&self, space: &Space) -> RunnerResult<Space> {
        self.step("ensure_space", space.chain().key())?;
        self.inner.ensure_space(space)
    }

    fn delete_space(&self, space: &Space) -> RunnerResult<()> {
        self.step("delete_space", space.chain().key())?;
        self.inner.delete_space(space)
    }

    fn purge_space(&self, space: &Space) -> RunnerResult<()> {
        self.step("purge_space", space.chain().key())?;
        self.inner.purge_space(space)
    }

    fn get_stack(&self, stack: &Stack) -> RunnerResult<Stack> {
        self.step("get_stack", stack.chain().key())?;
        self.inner.get_stack(stack)
    }

    fn list_stacks(&self, realm: &str, space: &str) -> RunnerResult<Vec<Stack>> {
        self.step("list_stacks", format!("{realm}/{space}"))?;
        self.inner.list_stacks(realm, space)
    }

    fn create_stack(&self, stack: &Stack) -> RunnerResult<Stack> {
        self.step("create_stack", stack.chain().key())?;
        self.inner.create_stack(stack)
    }

    fn ensure_stack(&self, stack: &Stack) -> RunnerResult<Stack> {
        self.step("ensure_stack", stack.chain().key())?;
        self.inner.ensure_stack(stack)
    }

    fn delete_stack(&self, stack: &Stack) -> RunnerResult<()> {
        self.step("delete_stack", stack.chain().key())?;
        self.inner.delete_stack(stack)
    }

    fn purge_stack(&self, stack: &Stack) -> RunnerResult<()> {
        self.step("purge_stack", stack.chain().key())?;
        self.inner.purge_stack(stack)
    }

    fn get_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        self.step("get_cell", cell.chain().key())?;
        self.inner.get_cell(cell)
    }

    fn list_cells(&self, realm: &str, space: &str, stack: &str) -> RunnerResult<Vec<Cell>> {
        self.step("list_cells", format!("{realm}/{space}/{stack}"))?;
        self.inner.list_cells(realm, space, stack)
    }

    fn create_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        self.step("create_cell", cell.chain().key())?;
        self.inner.create_cell(cell)
    }

    fn ensure_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        self.step("ensure_cell", cell.chain().key())?;
        self.inner.ensure_cell(cell)
    }

    fn delete_cell(&self, cell: &Cell) -> RunnerResult<()> {
        self.step("delete_cell", cell.chain().key())?;
        self.inner.delete_cell(cell)
    }

    fn purge_cell(&self, cell: &Cell) -> RunnerResult<()> {
        self.step("purge_cell", cell.chain().key())?;
        self.inner.purge_cell(cell)
    }

    fn start_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        self.step("start_cell", cell.chain().key())?;
        self.inner.start_cell(cell)
    }

    fn kill_cell(&self, cell: &Cell) -> RunnerResult<Cell> {
        self.step("kill_cell", cell.chain().key())?;
        self.inner.kill_cell(cell)
    }

    fn update_cell_metadata(&self, cell: &Cell) -> RunnerResult<Cell> {
        self.step("update_cell_metadata", cell.chain().key())?;
        self.inner.update_cell_metadata(cell)
    }

    fn get_container(&self, container: &Container) -> RunnerResult<Container> {
        self.step("get_container", container.chain().key())?;
        self.inner.get_container(container)
    }

    fn list_containers(
        &self,
        realm: &str,
        space: &str,
        stack: &str,
        cell: &str,
    ) -> RunnerResult<Vec<ContainerSpec>> {
        self.step("list_containers", format!("{realm}/{space}/{stack}/{cell}"))?;
        self.inner.list_containers(realm, space, stack, cell)
    }

    fn create_container(&self, container: &Container) -> RunnerResult<Container> {
        self.step("create_container", container.chain().key())?;
        self.inner.create_container(container)
    }

    fn ensure_container(&self, container: &Container) -> RunnerResult<Container> {
        self.step("ensure_container", container.chain().key())?;
        self.inner.ensure_container(container)
    }

    fn delete_container(&self, container: &Container) -> RunnerResult<()> {
        self.step("delete_container", container.chain().key())?;
        self.inner.delete_container(container)
    }

    fn purge_container(&self, container: &Container) -> RunnerResult<()> {
        self.step("purge_container", container.chain().key())?;
        self.inner.purge_container(container)
    }

    fn start_container(&self, container: &Container) -> RunnerResult<Container> {
        self.step("start_container", container.chain().key())?;
        self.inner.start_container(container)
    }

    fn kill_container(&self, container: &Container) -> RunnerResult<Container> {
        self.step("kill_container", container.chain().key())?;
        self.inner.kill_container(container)
    }
}

pub fn controller() -> Controller<ScriptedRunner> {
    Controller::new(ScriptedRunner::new())
}

pub fn container_spec(id: &str) -> ContainerSpec {
    ContainerSpec {
        id: id.to_string(),
        image: format!("registry.local/{id}:1"),
        ..Default::default()
    }
}

/// Create realm `r`, space `s`, stack `st`.
pub fn seed_stack(ctl: &Controller<ScriptedRunner>, r: &str, s: &str, st: &str) {
    ctl.create_realm(&Realm::new(r)).unwrap();
    ctl.create_space(&Space::new(r, s)).unwrap();
    ctl.create_stack(&Stack::new(r, s, st)).unwrap();
}

/// Create the full chain down to a cell running `containers`.
pub fn seed_cell(
    ctl: &Controller<ScriptedRunner>,
    chain: (&str, &str, &str, &str),
    containers: &[&str],
) -> Cell {
    let (r, s, st, c) = chain;
    seed_stack(ctl, r, s, st);
    let mut cell = Cell::new(r, s, st, c);
    cell.spec.containers = containers.iter().map(|id| container_spec(id)).collect();
    ctl.create_cell(&cell).unwrap().cell
}
