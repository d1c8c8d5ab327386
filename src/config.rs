use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::schema::DATABASE_NAME;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ChanbaseConfig {
    pub database: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("chanbase.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".chanbase").join(DATABASE_NAME)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ChanbaseConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ChanbaseConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ChanbaseConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// `--database` flag, then the config file, then `.chanbase/channels.db` under `base`
pub fn resolve_database_path(flag: Option<&Path>, config: Option<&ChanbaseConfig>, base: &Path) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    match config.and_then(|c| c.database.as_deref()) {
        Some(db) => base.join(db),
        None => default_database_path_in(base),
    }
}
