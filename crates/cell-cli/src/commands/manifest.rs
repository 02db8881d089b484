//! `cellctl apply` / `cellctl delete-docs` over manifest files.

use std::path::Path;

use anyhow::{Context, bail};
use tracing::info;

use cell_core::document::parse_documents;
use cellgrid_controller::{BatchResult, Controller};
use cellgrid_runner::Runner;

use super::print_json;

fn read_manifest(path: &Path) -> anyhow::Result<Vec<cell_core::Document>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let documents = parse_documents(&content)
        .with_context(|| format!("invalid manifest {}", path.display()))?;
    info!(path = %path.display(), documents = documents.len(), "manifest loaded");
    Ok(documents)
}

/// Print the per-document outcomes; fail if any document failed.
fn report(result: &BatchResult) -> anyhow::Result<()> {
    print_json(result)?;
    let failed = result.failed();
    if failed > 0 {
        bail!("{failed} of {} documents failed", result.resources.len());
    }
    Ok(())
}

pub fn apply<R: Runner>(ctl: &Controller<R>, path: &Path) -> anyhow::Result<()> {
    let documents = read_manifest(path)?;
    let result = ctl.apply_documents(&documents)?;
    report(&result)
}

pub fn delete_docs<R: Runner>(
    ctl: &Controller<R>,
    path: &Path,
    cascade: bool,
    force: bool,
) -> anyhow::Result<()> {
    let documents = read_manifest(path)?;
    let result = ctl.delete_documents(&documents, cascade, force)?;
    report(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cell_core::CellConfig;

    const MANIFEST: &str = r#"[
        {"apiVersion": "v1beta1", "kind": "Space", "metadata": {"name": "s1"},
         "spec": {"realmId": "r1"}},
        {"apiVersion": "v1beta1", "kind": "Realm", "metadata": {"name": "r1"}}
    ]"#;

    fn controller(dir: &Path) -> Controller<cellgrid_runner::LocalRunner> {
        let mut config = CellConfig::default();
        config.store.path = dir.join("cellgrid.redb");
        crate::commands::open_controller(&config).unwrap()
    }

    #[test]
    fn apply_then_delete_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("tree.json");
        std::fs::write(&manifest, MANIFEST).unwrap();
        let ctl = controller(dir.path());

        apply(&ctl, &manifest).unwrap();
        assert_eq!(ctl.list_spaces("r1").unwrap().len(), 1);

        delete_docs(&ctl, &manifest, false, false).unwrap();
        assert!(ctl.list_realms().unwrap().is_empty());
    }

    #[test]
    fn failed_documents_fail_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("orphan.json");
        std::fs::write(
            &manifest,
            r#"{"apiVersion": "v1beta1", "kind": "Stack", "metadata": {"name": "st"},
                "spec": {"realmId": "r1", "spaceId": "missing"}}"#,
        )
        .unwrap();
        let ctl = controller(dir.path());

        let err = apply(&ctl, &manifest).unwrap_err();
        assert!(err.to_string().contains("1 of 1 documents failed"));
    }

    #[test]
    fn unreadable_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctl = controller(dir.path());
        let err = apply(&ctl, &dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
