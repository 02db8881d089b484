//! Start/kill for cells and containers.

use tracing::info;

use cell_core::{Cell, CellState, Container, Kind, NameChain};
use cellgrid_runner::Runner;

use crate::controller::Controller;
use crate::error::{ControllerError, ControllerResult, Operation};
use crate::validate;

impl<R: Runner> Controller<R> {
    /// Start every container of a cell and mark it Ready.
    pub fn start_cell(&self, cell: &Cell) -> ControllerResult<Cell> {
        self.transition_cell(cell, Operation::Start, CellState::Ready)
    }

    /// Stop every container of a cell and mark it Stopped.
    pub fn kill_cell(&self, cell: &Cell) -> ControllerResult<Cell> {
        self.transition_cell(cell, Operation::Kill, CellState::Stopped)
    }

    pub fn start_container(&self, container: &Container) -> ControllerResult<Container> {
        self.transition_container(container, Operation::Start)
    }

    pub fn kill_container(&self, container: &Container) -> ControllerResult<Container> {
        self.transition_container(container, Operation::Kill)
    }

    fn transition_cell(
        &self,
        cell: &Cell,
        op: Operation,
        target: CellState,
    ) -> ControllerResult<Cell> {
        let chain = validate::resolve(Kind::Cell, &cell.chain())?;
        let _session = self.session(op, Kind::Cell, &chain)?;
        let fail = || ControllerError::runner(op, Kind::Cell, &chain);

        let pre = self.inspect_cell(&chain)?;
        if !pre.metadata_exists {
            return Err(ControllerError::not_found(Kind::Cell, &chain));
        }
        let mut cell = match op {
            Operation::Kill => self.runner().kill_cell(&pre.cell),
            _ => self.runner().start_cell(&pre.cell),
        }
        .map_err(fail())?;
        cell.status.state = target;
        let cell = self.runner().update_cell_metadata(&cell).map_err(fail())?;
        info!(%chain, state = ?cell.status.state, "cell {op} complete");
        Ok(cell)
    }

    fn transition_container(
        &self,
        container: &Container,
        op: Operation,
    ) -> ControllerResult<Container> {
        let chain = validate::resolve(Kind::Container, &container.chain())?;
        let _session = self.session(op, Kind::Container, &chain)?;

        let pre = self.inspect_container(&chain)?;
        if !pre.cell_metadata_exists {
            let cell = NameChain::cell(&chain.realm, &chain.space, &chain.stack, &chain.cell);
            return Err(ControllerError::not_found(Kind::Cell, &cell));
        }
        if !pre.container_exists {
            return Err(ControllerError::not_found(Kind::Container, &chain));
        }
        let container = match op {
            Operation::Kill => self.runner().kill_container(&pre.container),
            _ => self.runner().start_container(&pre.container),
        }
        .map_err(ControllerError::runner(op, Kind::Container, &chain))?;
        info!(%chain, state = ?container.status.state, "container {op} complete");
        Ok(container)
    }
}
