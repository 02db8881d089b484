//! cellgrid-runner — the execution backend seam.
//!
//! The controller never touches cgroups, the container runtime, or CNI
//! directly. It drives a [`Runner`]: one family of methods per resource
//! kind (`get`, `list`, `create`, `ensure`, `delete`, `purge`), infra
//! existence predicates, and cell/container lifecycle actions.
//!
//! # Components
//!
//! - **`runner`**: the `Runner` capability trait
//! - **`error`**: `RunnerError`, with NotFound distinguishable from other failures
//! - **`local`**: `LocalRunner`, a reference backend that records metadata
//!   and host infra in a `cellgrid-state` store

pub mod error;
pub mod local;
pub mod runner;

pub use error::{RunnerError, RunnerResult};
pub use local::LocalRunner;
pub use runner::Runner;
