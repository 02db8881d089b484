//! cellgrid-state — embedded state store for CellGrid.
//!
//! Backed by [redb](https://docs.rs/redb), persists resource metadata for
//! realms, spaces, stacks, and cells, plus the host infra records (cgroups,
//! runtime namespaces, CNI configs, runtime tasks) owned by them.
//!
//! # Architecture
//!
//! All values are JSON-serialized into redb's `&[u8]` value columns.
//! Metadata keys are `/`-joined name chains (`{realm}/{space}/{stack}`), so
//! the children of a resource are a prefix scan away. Containers are not a
//! table of their own: they live in their cell's `spec.containers`.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
