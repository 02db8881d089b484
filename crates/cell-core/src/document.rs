//! Manifest documents: the external schema accepted by batch apply/delete.
//!
//! A manifest is a JSON array (or a single object) of resource documents:
//!
//! ```json
//! [
//!   { "apiVersion": "v1beta1", "kind": "Realm", "metadata": { "name": "r1" } },
//!   { "apiVersion": "v1beta1", "kind": "Space", "metadata": { "name": "s1" },
//!     "spec": { "realmId": "r1" } }
//! ]
//! ```
//!
//! Parsing only guarantees structure and a non-blank `metadata.name`.
//! Mapping into the internal model lives in [`crate::convert`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::Kind;

/// The only manifest API version understood by this release.
pub const API_VERSION: &str = "v1beta1";

/// Errors raised while parsing a manifest.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document {index}: missing or non-string \"kind\"")]
    MissingKind { index: usize },

    #[error("document {index}: unknown kind \"{kind}\"")]
    UnknownKind { index: usize, kind: String },

    #[error("document {index}: invalid {kind} document: {source}")]
    Invalid {
        index: usize,
        kind: Kind,
        #[source]
        source: serde_json::Error,
    },

    #[error("document {index}: metadata.name is required")]
    MissingName { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmDoc {
    pub api_version: String,
    pub kind: String,
    pub metadata: DocMetadata,
    #[serde(default)]
    pub spec: RealmDocSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmDocSpec {
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDoc {
    pub api_version: String,
    pub kind: String,
    pub metadata: DocMetadata,
    #[serde(default)]
    pub spec: SpaceDocSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDocSpec {
    #[serde(default)]
    pub realm_id: String,
    #[serde(default)]
    pub cni_config_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackDoc {
    pub api_version: String,
    pub kind: String,
    pub metadata: DocMetadata,
    #[serde(default)]
    pub spec: StackDocSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackDocSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub realm_id: String,
    #[serde(default)]
    pub space_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDoc {
    pub api_version: String,
    pub kind: String,
    pub metadata: DocMetadata,
    #[serde(default)]
    pub spec: CellDocSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDocSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub realm_id: String,
    #[serde(default)]
    pub space_id: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub root_container_id: Option<String>,
    #[serde(default)]
    pub containers: Vec<ContainerDocSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDoc {
    pub api_version: String,
    pub kind: String,
    pub metadata: DocMetadata,
    #[serde(default)]
    pub spec: ContainerDocSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDocSpec {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub realm_id: String,
    #[serde(default)]
    pub space_id: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub cell_id: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub cni_config_path: Option<String>,
}

/// The kind-specific payload of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBody {
    Realm(RealmDoc),
    Space(SpaceDoc),
    Stack(StackDoc),
    Cell(CellDoc),
    Container(ContainerDoc),
}

impl DocumentBody {
    /// The kind of the carried payload.
    pub fn kind(&self) -> Kind {
        match self {
            DocumentBody::Realm(_) => Kind::Realm,
            DocumentBody::Space(_) => Kind::Space,
            DocumentBody::Stack(_) => Kind::Stack,
            DocumentBody::Cell(_) => Kind::Cell,
            DocumentBody::Container(_) => Kind::Container,
        }
    }

    pub fn metadata(&self) -> &DocMetadata {
        match self {
            DocumentBody::Realm(d) => &d.metadata,
            DocumentBody::Space(d) => &d.metadata,
            DocumentBody::Stack(d) => &d.metadata,
            DocumentBody::Cell(d) => &d.metadata,
            DocumentBody::Container(d) => &d.metadata,
        }
    }

    /// Trimmed `metadata.name`.
    pub fn name(&self) -> &str {
        self.metadata().name.trim()
    }
}

/// A parsed manifest document: its position, declared kind, and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub index: usize,
    pub kind: Kind,
    pub body: DocumentBody,
}

impl Document {
    pub fn new(index: usize, body: DocumentBody) -> Self {
        Self {
            index,
            kind: body.kind(),
            body,
        }
    }
}

/// Parse a manifest (JSON array or single object) into documents.
pub fn parse_documents(input: &str) -> Result<Vec<Document>, DocumentError> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    let values = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| parse_document(index, value))
        .collect()
}

fn parse_document(index: usize, value: serde_json::Value) -> Result<Document, DocumentError> {
    let kind_str = value
        .get("kind")
        .and_then(|k| k.as_str())
        .ok_or(DocumentError::MissingKind { index })?;
    let kind = Kind::parse(kind_str).ok_or_else(|| DocumentError::UnknownKind {
        index,
        kind: kind_str.to_string(),
    })?;

    let invalid = |source| DocumentError::Invalid {
        index,
        kind,
        source,
    };
    let body = match kind {
        Kind::Realm => DocumentBody::Realm(serde_json::from_value(value).map_err(invalid)?),
        Kind::Space => DocumentBody::Space(serde_json::from_value(value).map_err(invalid)?),
        Kind::Stack => DocumentBody::Stack(serde_json::from_value(value).map_err(invalid)?),
        Kind::Cell => DocumentBody::Cell(serde_json::from_value(value).map_err(invalid)?),
        Kind::Container => {
            DocumentBody::Container(serde_json::from_value(value).map_err(invalid)?)
        }
    };

    if body.name().is_empty() {
        return Err(DocumentError::MissingName { index });
    }

    Ok(Document::new(index, body))
}
