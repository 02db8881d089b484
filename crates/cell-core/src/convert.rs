//! Conversion from manifest documents to the internal resource model.

use thiserror::Error;

use crate::document::{
    API_VERSION, CellDoc, ContainerDoc, ContainerDocSpec, DocMetadata, DocumentBody, RealmDoc,
    SpaceDoc, StackDoc,
};
use crate::chain::NameChain;
use crate::resource::*;

/// Errors mapping an external document onto the internal model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("unsupported apiVersion \"{found}\" (expected \"{}\")", API_VERSION)]
    UnsupportedApiVersion { found: String },

    #[error("document kind \"{found}\" does not match {expected}")]
    KindMismatch { expected: Kind, found: String },

    #[error("container entry {position} in cell \"{cell}\" is marked root but has no id")]
    AnonymousRootContainer { cell: String, position: usize },
}

fn check_header(api_version: &str, kind: &str, expected: Kind) -> Result<(), ConversionError> {
    // A blank apiVersion is taken as the current one.
    let api_version = api_version.trim();
    if !api_version.is_empty() && api_version != API_VERSION {
        return Err(ConversionError::UnsupportedApiVersion {
            found: api_version.to_string(),
        });
    }
    if Kind::parse(kind) != Some(expected) {
        return Err(ConversionError::KindMismatch {
            expected,
            found: kind.to_string(),
        });
    }
    Ok(())
}

fn metadata(doc: &DocMetadata) -> Metadata {
    Metadata {
        name: doc.name.clone(),
        labels: doc.labels.clone(),
    }
}

fn container_spec(doc: &ContainerDocSpec) -> ContainerSpec {
    ContainerSpec {
        id: doc.id.clone(),
        realm_name: doc.realm_id.clone(),
        space_name: doc.space_id.clone(),
        stack_name: doc.stack_id.clone(),
        cell_name: doc.cell_id.clone(),
        image: doc.image.clone(),
        command: doc.command.clone().unwrap_or_default(),
        args: doc.args.clone(),
        env: doc.env.clone(),
        root: doc.root,
        cni_config_path: doc.cni_config_path.clone().unwrap_or_default(),
    }
}

impl RealmDoc {
    pub fn to_model(&self) -> Result<Realm, ConversionError> {
        check_header(&self.api_version, &self.kind, Kind::Realm)?;
        Ok(Realm {
            metadata: metadata(&self.metadata),
            spec: RealmSpec {
                namespace: self.spec.namespace.clone().unwrap_or_default(),
            },
            status: RealmStatus::default(),
        })
    }
}

impl SpaceDoc {
    pub fn to_model(&self) -> Result<Space, ConversionError> {
        check_header(&self.api_version, &self.kind, Kind::Space)?;
        Ok(Space {
            metadata: metadata(&self.metadata),
            spec: SpaceSpec {
                realm_name: self.spec.realm_id.clone(),
                cni_config_path: self.spec.cni_config_path.clone().unwrap_or_default(),
            },
            status: SpaceStatus::default(),
        })
    }
}

impl StackDoc {
    pub fn to_model(&self) -> Result<Stack, ConversionError> {
        check_header(&self.api_version, &self.kind, Kind::Stack)?;
        Ok(Stack {
            metadata: metadata(&self.metadata),
            spec: StackSpec {
                id: self.spec.id.clone().unwrap_or_default(),
                realm_name: self.spec.realm_id.clone(),
                space_name: self.spec.space_id.clone(),
            },
            status: StackStatus::default(),
        })
    }
}

impl CellDoc {
    pub fn to_model(&self) -> Result<Cell, ConversionError> {
        check_header(&self.api_version, &self.kind, Kind::Cell)?;
        for (position, c) in self.spec.containers.iter().enumerate() {
            if c.root && c.id.trim().is_empty() {
                return Err(ConversionError::AnonymousRootContainer {
                    cell: self.metadata.name.clone(),
                    position,
                });
            }
        }
        Ok(Cell {
            metadata: metadata(&self.metadata),
            spec: CellSpec {
                id: self.spec.id.clone().unwrap_or_default(),
                realm_name: self.spec.realm_id.clone(),
                space_name: self.spec.space_id.clone(),
                stack_name: self.spec.stack_id.clone(),
                root_container_id: self.spec.root_container_id.clone().unwrap_or_default(),
                containers: self.spec.containers.iter().map(container_spec).collect(),
            },
            status: CellStatus::default(),
        })
    }
}

impl ContainerDoc {
    pub fn to_model(&self) -> Result<Container, ConversionError> {
        check_header(&self.api_version, &self.kind, Kind::Container)?;
        Ok(Container {
            metadata: metadata(&self.metadata),
            spec: container_spec(&self.spec),
            status: ContainerStatus::default(),
        })
    }
}

impl DocumentBody {
    /// Full name chain as written in the document (untrimmed).
    pub fn chain(&self) -> NameChain {
        let name = &self.metadata().name;
        match self {
            DocumentBody::Realm(_) => NameChain::realm(name),
            DocumentBody::Space(d) => NameChain::space(&d.spec.realm_id, name),
            DocumentBody::Stack(d) => {
                NameChain::stack(&d.spec.realm_id, &d.spec.space_id, name)
            }
            DocumentBody::Cell(d) => NameChain::cell(
                &d.spec.realm_id,
                &d.spec.space_id,
                &d.spec.stack_id,
                name,
            ),
            DocumentBody::Container(d) => NameChain::container(
                &d.spec.realm_id,
                &d.spec.space_id,
                &d.spec.stack_id,
                &d.spec.cell_id,
                name,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CellDocSpec, RealmDocSpec};

    fn realm_doc(api_version: &str, kind: &str) -> RealmDoc {
        RealmDoc {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            metadata: DocMetadata {
                name: "r1".to_string(),
                ..Default::default()
            },
            spec: RealmDocSpec {
                namespace: Some("ns1".to_string()),
            },
        }
    }

    #[test]
    fn realm_converts() {
        let realm = realm_doc(API_VERSION, "Realm").to_model().unwrap();
        assert_eq!(realm.metadata.name, "r1");
        assert_eq!(realm.spec.namespace, "ns1");
    }

    #[test]
    fn blank_api_version_is_accepted() {
        assert!(realm_doc("", "Realm").to_model().is_ok());
    }

    #[test]
    fn unsupported_api_version_fails() {
        let err = realm_doc("v2", "Realm").to_model().unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedApiVersion { .. }));
    }

    #[test]
    fn kind_mismatch_fails() {
        let err = realm_doc(API_VERSION, "Space").to_model().unwrap_err();
        assert_eq!(
            err,
            ConversionError::KindMismatch {
                expected: Kind::Realm,
                found: "Space".to_string()
            }
        );
    }

    #[test]
    fn anonymous_root_container_fails() {
        let doc = CellDoc {
            api_version: API_VERSION.to_string(),
            kind: "Cell".to_string(),
            metadata: DocMetadata {
                name: "c1".to_string(),
                ..Default::default()
            },
            spec: CellDocSpec {
                containers: vec![ContainerDocSpec {
                    root: true,
                    ..Default::default()
                }],
                ..Default::default()
            },
        };
        let err = doc.to_model().unwrap_err();
        assert!(matches!(
            err,
            ConversionError::AnonymousRootContainer { position: 0, .. }
        ));
    }
}
