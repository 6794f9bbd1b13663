//! Scaffolding for a new menu directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::core::types::default_executors;
use crate::io::config::{DEFAULT_CONFIG_FILE, MenuConfig, MenuPaths, write_config};
use crate::io::menu_store::write_json;
use crate::menu::default_menu;

/// Options for [`init_menu`].
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing files.
    pub force: bool,
}

/// Write `menusys.toml`, the default menu and executors documents and an
/// empty scripts directory into `root`.
///
/// Fails if `menusys.toml` already exists unless `options.force` is set.
pub fn init_menu(root: &Path, options: &InitOptions) -> Result<(PathBuf, MenuPaths)> {
    let config_path = root.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() && !options.force {
        return Err(anyhow!(
            "menusys init: {} already exists (use --force to overwrite)",
            config_path.display()
        ));
    }

    let config = MenuConfig::default();
    let paths = config.paths(&config_path);

    fs::create_dir_all(&paths.scripts_dir)
        .with_context(|| format!("create directory {}", paths.scripts_dir.display()))?;
    write_config(&config_path, &config)?;
    write_json(&paths.nodes, &default_menu())?;
    write_json(&paths.executors, &default_executors())?;

    Ok((config_path, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::load_config;
    use crate::io::menu_store::{load_executors, load_nodes};

    #[test]
    fn init_creates_loadable_layout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (config_path, paths) =
            init_menu(temp.path(), &InitOptions { force: false }).expect("init");

        assert!(config_path.is_file());
        assert!(paths.scripts_dir.is_dir());
        assert_eq!(load_config(&config_path).expect("config"), MenuConfig::default());
        assert_eq!(load_nodes(&paths.nodes).expect("nodes"), default_menu());
        assert_eq!(
            load_executors(&paths.executors).expect("executors"),
            default_executors()
        );
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_menu(temp.path(), &InitOptions { force: false }).expect("first init");
        let err = init_menu(temp.path(), &InitOptions { force: false }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        init_menu(temp.path(), &InitOptions { force: true }).expect("forced init");
    }
}
