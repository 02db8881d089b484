//! Child listings.

use cell_core::{Cell, ContainerSpec, Kind, NameChain, Realm, Space, Stack};
use cellgrid_runner::Runner;

use crate::controller::Controller;
use crate::error::{ControllerError, ControllerResult, Operation};
use crate::validate;

impl<R: Runner> Controller<R> {
    pub fn list_realms(&self) -> ControllerResult<Vec<Realm>> {
        self.runner()
            .list_realms()
            .map_err(ControllerError::runner(Operation::List, Kind::Realm, &NameChain::default()))
    }

    pub fn list_spaces(&self, realm: &str) -> ControllerResult<Vec<Space>> {
        let chain = validate::resolve(Kind::Realm, &NameChain::realm(realm))?;
        self.runner()
            .list_spaces(&chain.realm)
            .map_err(ControllerError::runner(Operation::List, Kind::Space, &chain))
    }

    pub fn list_stacks(&self, realm: &str, space: &str) -> ControllerResult<Vec<Stack>> {
        let chain = validate::resolve(Kind::Space, &NameChain::space(realm, space))?;
        self.runner()
            .list_stacks(&chain.realm, &chain.space)
            .map_err(ControllerError::runner(Operation::List, Kind::Stack, &chain))
    }

    pub fn list_cells(&self, realm: &str, space: &str, stack: &str) -> ControllerResult<Vec<Cell>> {
        let chain = validate::resolve(Kind::Stack, &NameChain::stack(realm, space, stack))?;
        self.runner()
            .list_cells(&chain.realm, &chain.space, &chain.stack)
            .map_err(ControllerError::runner(Operation::List, Kind::Cell, &chain))
    }

    pub fn list_containers(
        &self,
        realm: &str,
        space: &str,
        stack: &str,
        cell: &str,
    ) -> ControllerResult<Vec<ContainerSpec>> {
        let chain = validate::resolve(Kind::Cell, &NameChain::cell(realm, space, stack, cell))?;
        self.runner()
            .list_containers(&chain.realm, &chain.space, &chain.stack, &chain.cell)
            .map_err(ControllerError::runner(Operation::List, Kind::Container, &chain))
    }
}
