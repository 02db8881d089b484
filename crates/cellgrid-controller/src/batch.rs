//! Batch document processor.
//!
//! Applies or deletes a heterogeneous set of parsed manifest documents in
//! dependency order. Each document is converted and dispatched on its own;
//! its failure is recorded in its [`ResourceOutcome`] and the batch moves
//! on. Only structurally invalid input fails the whole call, and that is
//! detected before anything runs.

use std::cmp::Reverse;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use cell_core::{Document, DocumentBody, Kind};
use cellgrid_runner::Runner;

use crate::controller::Controller;
use crate::error::{ControllerError, ControllerResult};

/// Errors that reject a batch as a whole.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("document {index}: declared kind {declared} does not match its {found} body")]
    InvalidDocument {
        index: usize,
        declared: Kind,
        found: Kind,
    },
}

/// What happened to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "updated")]
    Updated,
    #[serde(rename = "deleted")]
    Deleted,
    #[serde(rename = "not found")]
    NotFound,
    #[serde(rename = "failed")]
    Failed,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
            Action::NotFound => "not found",
            Action::Failed => "failed",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct ResourceOutcome {
    /// Position of the document in the submitted batch.
    pub index: usize,
    pub kind: Kind,
    pub name: String,
    pub action: Action,
    /// Children removed along with this resource (`"space:s1"`, ...).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cascaded: Vec<String>,
    #[serde(
        serialize_with = "error_message",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<ControllerError>,
}

impl ResourceOutcome {
    fn new(doc: &Document, action: Action) -> Self {
        Self {
            index: doc.index,
            kind: doc.kind,
            name: doc.body.name().to_string(),
            action,
            cascaded: Vec::new(),
            error: None,
        }
    }
}

fn error_message<S: Serializer>(error: &Option<ControllerError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.serialize_str(&e.to_string()),
        None => s.serialize_none(),
    }
}

/// Per-document outcomes, in processing order.
#[derive(Debug, Default, Serialize)]
pub struct BatchResult {
    pub resources: Vec<ResourceOutcome>,
}

impl BatchResult {
    /// Number of documents that ended in `failed`.
    pub fn failed(&self) -> usize {
        self.resources
            .iter()
            .filter(|r| r.action == Action::Failed)
            .count()
    }
}

/// Reject documents whose declared kind disagrees with their body.
fn check_structure(documents: &[Document]) -> Result<(), BatchError> {
    for doc in documents {
        let found = doc.body.kind();
        if doc.kind != found {
            return Err(BatchError::InvalidDocument {
                index: doc.index,
                declared: doc.kind,
                found,
            });
        }
    }
    Ok(())
}

/// Whether a delete marker names a cascaded child rather than infra.
fn is_child_marker(entry: &str) -> bool {
    Kind::ALL.iter().any(|k| {
        entry
            .strip_prefix(k.label())
            .is_some_and(|rest| rest.starts_with(':'))
    })
}

fn conversion(body: &DocumentBody, index: usize) -> impl FnOnce(cell_core::ConversionError) -> ControllerError {
    let kind = body.kind();
    move |source| ControllerError::Conversion {
        kind,
        index,
        source,
    }
}

impl<R: Runner> Controller<R> {
    /// Delete every document, children before parents.
    ///
    /// Documents are stable-sorted Container, Cell, Stack, Space, Realm.
    /// A resource that does not exist, or whose parent does not, is
    /// reported as `not found` without an error. A child that vanishes
    /// mid-cascade fails the document instead. Cells take their containers
    /// with them regardless of `cascade`.
    pub fn delete_documents(
        &self,
        documents: &[Document],
        cascade: bool,
        force: bool,
    ) -> Result<BatchResult, BatchError> {
        check_structure(documents)?;
        let mut ordered: Vec<&Document> = documents.iter().collect();
        ordered.sort_by_key(|d| Reverse(d.kind.depth()));

        let mut result = BatchResult::default();
        for doc in ordered {
            let target = doc.body.chain().trimmed();
            let outcome = match self.delete_document(doc, cascade, force) {
                Ok(deleted) => {
                    let mut outcome = ResourceOutcome::new(doc, Action::Deleted);
                    outcome.cascaded = deleted.into_iter().filter(|e| is_child_marker(e)).collect();
                    info!(index = doc.index, kind = %doc.kind, name = %outcome.name, "document deleted");
                    outcome
                }
                Err(e) if e.is_not_found_for(&target) => {
                    debug!(index = doc.index, kind = %doc.kind, error = %e, "document target not found");
                    ResourceOutcome::new(doc, Action::NotFound)
                }
                Err(e) => {
                    warn!(index = doc.index, kind = %doc.kind, error = %e, "document delete failed");
                    let mut outcome = ResourceOutcome::new(doc, Action::Failed);
                    outcome.error = Some(e);
                    outcome
                }
            };
            result.resources.push(outcome);
        }
        info!(
            documents = result.resources.len(),
            failed = result.failed(),
            "batch delete complete"
        );
        Ok(result)
    }

    /// Create or ensure every document, parents before children.
    ///
    /// Documents are stable-sorted Realm, Space, Stack, Cell, Container.
    pub fn apply_documents(&self, documents: &[Document]) -> Result<BatchResult, BatchError> {
        check_structure(documents)?;
        let mut ordered: Vec<&Document> = documents.iter().collect();
        ordered.sort_by_key(|d| d.kind.depth());

        let mut result = BatchResult::default();
        for doc in ordered {
            let outcome = match self.apply_document(doc) {
                Ok(created) => {
                    let action = if created { Action::Created } else { Action::Updated };
                    info!(index = doc.index, kind = %doc.kind, name = doc.body.name(), %action, "document applied");
                    ResourceOutcome::new(doc, action)
                }
                Err(e) => {
                    warn!(index = doc.index, kind = %doc.kind, error = %e, "document apply failed");
                    let mut outcome = ResourceOutcome::new(doc, Action::Failed);
                    outcome.error = Some(e);
                    outcome
                }
            };
            result.resources.push(outcome);
        }
        info!(
            documents = result.resources.len(),
            failed = result.failed(),
            "batch apply complete"
        );
        Ok(result)
    }

    fn delete_document(
        &self,
        doc: &Document,
        cascade: bool,
        force: bool,
    ) -> ControllerResult<Vec<String>> {
        let convert = conversion(&doc.body, doc.index);
        Ok(match &doc.body {
            DocumentBody::Realm(d) => {
                let realm = d.to_model().map_err(convert)?;
                self.delete_realm(&realm, force, cascade)?.deleted
            }
            DocumentBody::Space(d) => {
                let space = d.to_model().map_err(convert)?;
                self.delete_space(&space, force, cascade)?.deleted
            }
            DocumentBody::Stack(d) => {
                let stack = d.to_model().map_err(convert)?;
                self.delete_stack(&stack, force, cascade)?.deleted
            }
            DocumentBody::Cell(d) => {
                let cell = d.to_model().map_err(convert)?;
                self.delete_cell(&cell)?.deleted
            }
            DocumentBody::Container(d) => {
                let container = d.to_model().map_err(convert)?;
                self.delete_container(&container)?.deleted
            }
        })
    }

    /// Returns whether the resource was newly created.
    fn apply_document(&self, doc: &Document) -> ControllerResult<bool> {
        let convert = conversion(&doc.body, doc.index);
        Ok(match &doc.body {
            DocumentBody::Realm(d) => self.create_realm(&d.to_model().map_err(convert)?)?.created,
            DocumentBody::Space(d) => self.create_space(&d.to_model().map_err(convert)?)?.created,
            DocumentBody::Stack(d) => self.create_stack(&d.to_model().map_err(convert)?)?.created,
            DocumentBody::Cell(d) => self.create_cell(&d.to_model().map_err(convert)?)?.created,
            DocumentBody::Container(d) => {
                self.create_container(&d.to_model().map_err(convert)?)?.created
            }
        })
    }
}
