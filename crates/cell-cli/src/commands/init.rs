use std::path::Path;

use anyhow::bail;

use cell_core::CellConfig;

pub fn init(path: &Path, data_dir: &Path) -> anyhow::Result<()> {
    let output = path.join("cellgrid.toml");
    if output.exists() {
        bail!("{} already exists", output.display());
    }
    std::fs::create_dir_all(path)?;
    let config = CellConfig::scaffold(data_dir);
    std::fs::write(&output, config.to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffold_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), Path::new("/srv/cellgrid")).unwrap();

        let config = CellConfig::from_file(&dir.path().join("cellgrid.toml")).unwrap();
        assert_eq!(config.store.path, Path::new("/srv/cellgrid/cellgrid.redb"));
    }

    #[test]
    fn existing_config_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cellgrid.toml"), "# mine\n").unwrap();

        assert!(init(dir.path(), Path::new("/srv/cellgrid")).is_err());
        let kept = std::fs::read_to_string(dir.path().join("cellgrid.toml")).unwrap();
        assert_eq!(kept, "# mine\n");
    }
}
