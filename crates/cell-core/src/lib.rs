//! cell-core — shared types for CellGrid.
//!
//! The resource hierarchy is **Realm → Space → Stack → Cell → Container**.
//! Parent identity is carried as name-valued fields on each resource's spec
//! (never as pointers), so every resource serializes independently and is
//! resolved by name through the runner.

pub mod chain;
pub mod config;
pub mod convert;
pub mod document;
pub mod resource;

pub use chain::{NameChain, NameError, check_name};
pub use config::CellConfig;
pub use convert::ConversionError;
pub use document::{Document, DocumentBody, DocumentError};
pub use resource::*;
