pub mod init;
pub mod manifest;
pub mod resource;

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use serde::Serialize;
use tracing::debug;

use cell_core::CellConfig;
use cellgrid_controller::Controller;
use cellgrid_runner::LocalRunner;
use cellgrid_state::StateStore;

/// A single resource addressed by its name chain.
#[derive(Subcommand, Debug, Clone)]
pub enum Target {
    Realm {
        name: String,
        /// Container namespace (defaults to the realm name)
        #[arg(long)]
        namespace: Option<String>,
    },
    Space {
        realm: String,
        name: String,
        /// Explicit CNI config list path
        #[arg(long)]
        cni_config: Option<String>,
    },
    Stack {
        realm: String,
        space: String,
        name: String,
    },
    Cell {
        realm: String,
        space: String,
        stack: String,
        name: String,
        /// Container to run in the cell, as `id=image` (repeatable)
        #[arg(long = "container", value_name = "ID=IMAGE")]
        containers: Vec<String>,
        /// Id of the root container
        #[arg(long)]
        root: Option<String>,
    },
    Container {
        realm: String,
        space: String,
        stack: String,
        cell: String,
        name: String,
        #[arg(long)]
        image: Option<String>,
    },
}

/// Something that can be started or killed.
#[derive(Subcommand, Debug, Clone)]
pub enum Workload {
    Cell {
        realm: String,
        space: String,
        stack: String,
        name: String,
    },
    Container {
        realm: String,
        space: String,
        stack: String,
        cell: String,
        name: String,
    },
}

/// Which children to list, and under which parent.
#[derive(Subcommand, Debug, Clone)]
pub enum ListTarget {
    Realms,
    Spaces {
        realm: String,
    },
    Stacks {
        realm: String,
        space: String,
    },
    Cells {
        realm: String,
        space: String,
        stack: String,
    },
    Containers {
        realm: String,
        space: String,
        stack: String,
        cell: String,
    },
}

/// Load cellgrid.toml if present, falling back to defaults.
pub fn load_config(path: &Path, store: Option<&Path>) -> anyhow::Result<CellConfig> {
    let mut config = if path.is_file() {
        CellConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        CellConfig::default()
    };
    if let Some(store) = store {
        config.store.path = store.to_path_buf();
    }
    Ok(config)
}

/// Open the state store and wire a controller over the local runner.
pub fn open_controller(config: &CellConfig) -> anyhow::Result<Controller<LocalRunner>> {
    if let Some(parent) = config.store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = StateStore::open(&config.store.path)
        .with_context(|| format!("failed to open state store {}", config.store.path.display()))?;
    debug!(store = %config.store.path.display(), "state store opened");
    Ok(Controller::new(LocalRunner::new(store, &config.runner)))
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("cellgrid.toml"), None).unwrap();
        assert!(!config.controller.default_cascade);
    }

    #[test]
    fn store_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cellgrid.toml");
        std::fs::write(&path, "[store]\npath = \"/nowhere/cg.redb\"\n").unwrap();

        let store = dir.path().join("other.redb");
        let config = load_config(&path, Some(&store)).unwrap();
        assert_eq!(config.store.path, store);
    }

    #[test]
    fn controller_opens_nested_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CellConfig::default();
        config.store.path = dir.path().join("state/cellgrid.redb");

        let ctl = open_controller(&config).unwrap();
        assert!(ctl.list_realms().unwrap().is_empty());
        assert!(config.store.path.exists());
    }
}
