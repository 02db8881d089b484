//! The controller handle and its runner session guard.

use tracing::debug;

use cell_core::{Kind, NameChain};
use cellgrid_runner::Runner;

use crate::error::{ControllerError, ControllerResult, Operation};

/// Resource lifecycle controller over a [`Runner`].
///
/// Operations are grouped by engine in sibling modules (`inspect`,
/// `reconcile`, `delete`, `purge`, `lifecycle`, `list`, `batch`); each adds
/// its methods to this type.
pub struct Controller<R: Runner> {
    runner: R,
}

impl<R: Runner> Controller<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Open a runner session for one mutating call.
    ///
    /// The session closes when the returned guard drops, on every exit
    /// path of the caller.
    pub(crate) fn session(
        &self,
        op: Operation,
        kind: Kind,
        chain: &NameChain,
    ) -> ControllerResult<Session<'_, R>> {
        self.runner
            .open()
            .map_err(ControllerError::runner(op, kind, chain))?;
        debug!(%op, %kind, %chain, "session opened");
        Ok(Session {
            runner: &self.runner,
        })
    }
}

/// RAII guard for an open runner session.
pub(crate) struct Session<'a, R: Runner> {
    runner: &'a R,
}

impl<R: Runner> Drop for Session<'_, R> {
    fn drop(&mut self) {
        self.runner.close();
    }
}
