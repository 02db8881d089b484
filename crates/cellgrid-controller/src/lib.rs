//! cellgrid-controller — the resource lifecycle controller.
//!
//! Drives a [`Runner`](cellgrid_runner::Runner) across the
//! Realm → Space → Stack → Cell → Container hierarchy:
//!
//! - **`inspect`**: Get: metadata lookup plus infra existence aggregation
//! - **`reconcile`**: idempotent Create/Ensure convergence
//! - **`delete`**: dependency-gated, depth-first cascade delete
//! - **`purge`**: delete plus unconditional deep clean, tolerant of
//!   missing metadata
//! - **`lifecycle`**: start/kill for cells and containers
//! - **`list`**: child listings per parent
//! - **`batch`**: ordered, best-effort apply/delete of manifest documents
//!
//! Every call is synchronous. Mutating entry points hold a runner session
//! for their whole duration; recursion inside a cascade reuses it.

pub mod batch;
pub mod controller;
pub mod delete;
pub mod error;
pub mod inspect;
pub mod lifecycle;
pub mod list;
pub mod purge;
pub mod reconcile;
mod validate;

pub use batch::{Action, BatchError, BatchResult, ResourceOutcome};
pub use controller::Controller;
pub use delete::{
    DeleteCellResult, DeleteContainerResult, DeleteRealmResult, DeleteResult, DeleteSpaceResult,
    DeleteStackResult,
};
pub use error::{ControllerError, ControllerResult, ErrorKind, Operation};
pub use inspect::{
    GetCellResult, GetContainerResult, GetRealmResult, GetSpaceResult, GetStackResult,
};
pub use purge::{
    PurgeCellResult, PurgeContainerResult, PurgeRealmResult, PurgeResult, PurgeSpaceResult,
    PurgeStackResult,
};
pub use reconcile::{
    ContainerOutcome, CreateCellResult, CreateContainerResult, CreateRealmResult,
    CreateSpaceResult, CreateStackResult,
};
