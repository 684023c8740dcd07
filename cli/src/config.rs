use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Environment variable that overrides the database location.
pub const DB_ENV_VAR: &str = "CALORIEMETER_DB";

pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolve the database path: `--db` flag, then `CALORIEMETER_DB`, then
    /// the platform data directory.
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_override.or_else(|| std::env::var_os(DB_ENV_VAR).map(PathBuf::from))
        {
            Some(path) => path,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "caloriemeter")
                    .context("Could not determine home directory")?;
                proj_dirs.data_dir().join("caloriemeter.db")
            }
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        Ok(Config { db_path })
    }
}
