//! cellgrid.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CGROUP_ROOT: &str = "/cellgrid";
pub const DEFAULT_CNI_CONF_DIR: &str = "/etc/cni/net.d";
pub const DEFAULT_STORE_PATH: &str = "/var/lib/cellgrid/cellgrid.redb";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Parent cgroup under which every realm scope is created.
    pub cgroup_root: String,
    /// Directory holding generated CNI network config lists.
    pub cni_conf_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Cascade deletes and purges when the caller does not say otherwise.
    #[serde(default)]
    pub default_cascade: bool,
    /// Skip dependency validation when the caller does not say otherwise.
    #[serde(default)]
    pub default_force: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cgroup_root: DEFAULT_CGROUP_ROOT.to_string(),
            cni_conf_dir: DEFAULT_CNI_CONF_DIR.to_string(),
        }
    }
}

impl CellConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CellConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a config rooted at `data_dir`.
    pub fn scaffold(data_dir: &Path) -> Self {
        CellConfig {
            store: StoreConfig {
                path: data_dir.join("cellgrid.redb"),
            },
            runner: RunnerConfig::default(),
            controller: ControllerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaffold() {
        let config = CellConfig::scaffold(Path::new("/tmp/cg"));
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("/tmp/cg/cellgrid.redb"));
        assert!(toml_str.contains(DEFAULT_CGROUP_ROOT));
    }

    #[test]
    fn test_parse_minimal() {
        let config: CellConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.runner.cni_conf_dir, DEFAULT_CNI_CONF_DIR);
        assert!(!config.controller.default_cascade);
    }

    #[test]
    fn test_parse_overrides() {
        let toml_str = r#"
[store]
path = "/data/cg.redb"

[runner]
cgroup_root = "/kubepods/cg"
cni_conf_dir = "/opt/cni"

[controller]
default_cascade = true
"#;
        let config: CellConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/data/cg.redb"));
        assert_eq!(config.runner.cgroup_root, "/kubepods/cg");
        assert!(config.controller.default_cascade);
        assert!(!config.controller.default_force);
    }
}
